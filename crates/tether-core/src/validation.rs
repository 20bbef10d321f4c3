use std::net::IpAddr;

use crate::error::ValidationError;

/// Validator for entity names and network identifiers.
pub struct Validator;

impl Validator {
    /// Validate a space name.
    /// Must be one or more groups of [a-z0-9] joined by single hyphens.
    pub fn validate_space_name(name: &str) -> Result<(), ValidationError> {
        let valid = !name.is_empty()
            && name.split('-').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            });
        if !valid {
            return Err(ValidationError::InvalidSpaceName(name.to_string()));
        }
        Ok(())
    }

    /// Validate a subnet CIDR.
    /// Must be `address/prefix` in canonical form: no host bits set, the
    /// address written the way `IpAddr` displays it, and a plain decimal prefix.
    pub fn validate_cidr(cidr: &str) -> Result<(), ValidationError> {
        let invalid = |reason| ValidationError::InvalidCidr(cidr.to_string(), reason);

        let (addr, prefix) = cidr.split_once('/').ok_or(invalid("missing prefix length"))?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid("bad address"))?;
        let prefix: u32 = prefix.parse().map_err(|_| invalid("bad prefix length"))?;

        let host_bits_clear = match addr {
            IpAddr::V4(v4) => {
                if prefix > 32 {
                    return Err(invalid("prefix length out of range"));
                }
                let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
                u32::from(v4) & !mask == 0
            }
            IpAddr::V6(v6) => {
                if prefix > 128 {
                    return Err(invalid("prefix length out of range"));
                }
                let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
                u128::from(v6) & !mask == 0
            }
        };
        if !host_bits_clear {
            return Err(invalid("host bits set"));
        }
        // The CIDR doubles as the subnet id, so one network has one spelling.
        if format!("{}/{}", addr, prefix) != cidr {
            return Err(invalid("not in canonical form"));
        }
        Ok(())
    }

    /// Validate a provider id.
    /// Must be non-empty, max 255 chars, with no whitespace.
    pub fn validate_provider_id(provider_id: &str) -> Result<(), ValidationError> {
        if provider_id.is_empty()
            || provider_id.len() > 255
            || provider_id.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::InvalidProviderId(provider_id.to_string()));
        }
        Ok(())
    }

    /// Validate a VLAN tag. Zero means untagged.
    pub fn validate_vlan_tag(tag: u32) -> Result<(), ValidationError> {
        if tag > 4094 {
            return Err(ValidationError::InvalidVlanTag(tag));
        }
        Ok(())
    }
}
