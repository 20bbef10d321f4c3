use redb::TableDefinition;

/// Table for storing documents of every collection.
/// Key: collection name, a 0x00 separator, then the document id
/// Value: serialized Document as bytes
pub const DOCUMENTS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("documents");

const SEPARATOR: u8 = 0x00;

/// Encode a document key (collection, id) to bytes.
pub fn encode_doc_key(collection: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(collection.len() + 1 + id.len());
    key.extend_from_slice(collection.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Key bounds covering exactly one collection: `start..end`.
pub fn collection_range(collection: &str) -> (Vec<u8>, Vec<u8>) {
    let mut start = collection.as_bytes().to_vec();
    let mut end = start.clone();
    start.push(SEPARATOR);
    end.push(SEPARATOR + 1);
    (start, end)
}
