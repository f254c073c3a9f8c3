//! Address codec for PORT arguments and PASV replies.
//!
//! The wire form is `h1,h2,h3,h4,p1,p2`: four IPv4 octets followed by the
//! port split into a high byte and a low byte.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::AddressError;

/// Decodes `h1,h2,h3,h4,p1,p2` into a socket address.
pub fn decode_address(text: &str) -> Result<SocketAddrV4, AddressError> {
    let dotted = text.trim().replace(',', ".");
    let fields: Vec<&str> = dotted.split('.').collect();
    if fields.len() != 6 {
        return Err(AddressError::FieldCount(fields.len()));
    }

    let ip_text = fields[..4].join(".");
    let ip: Ipv4Addr = ip_text
        .parse()
        .map_err(|_| AddressError::InvalidIp(ip_text.clone()))?;

    let port_byte = |field: &str| {
        field
            .parse::<u8>()
            .map_err(|_| AddressError::InvalidPort(field.to_string()))
    };
    let p1 = port_byte(fields[4])?;
    let p2 = port_byte(fields[5])?;

    Ok(SocketAddrV4::new(ip, u16::from(p1) * 256 + u16::from(p2)))
}

/// Encodes an address as `h1,h2,h3,h4,p1,p2`.
pub fn encode_address(ip: Ipv4Addr, port: u16) -> String {
    let ip_with_commas = ip.to_string().replace('.', ",");
    format!("{},{},{}", ip_with_commas, port / 256, port % 256)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ip_and_port() {
        let addr = decode_address("192,168,1,5,0,80").unwrap();
        assert_eq!(*addr.ip(), Ipv4Addr::new(192, 168, 1, 5));
        assert_eq!(addr.port(), 80);

        let addr = decode_address("127,0,0,1,78,32").unwrap();
        assert_eq!(addr.port(), 78 * 256 + 32);
    }

    #[test]
    fn encodes_high_and_low_port_bytes() {
        assert_eq!(
            encode_address(Ipv4Addr::new(192, 168, 1, 5), 20480),
            "192,168,1,5,80,0"
        );
        assert_eq!(encode_address(Ipv4Addr::LOCALHOST, 21), "127,0,0,1,0,21");
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            decode_address("192,168,1,5,80"),
            Err(AddressError::FieldCount(5))
        );
        assert_eq!(decode_address(""), Err(AddressError::FieldCount(1)));
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert_eq!(
            decode_address("192,168,1,5,x,80"),
            Err(AddressError::InvalidPort("x".into()))
        );
        assert_eq!(
            decode_address("192,168,1,5,1,256"),
            Err(AddressError::InvalidPort("256".into()))
        );
        assert!(matches!(
            decode_address("300,168,1,5,0,80"),
            Err(AddressError::InvalidIp(_))
        ));
    }
}
