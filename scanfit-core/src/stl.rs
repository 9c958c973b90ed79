/// Binary STL decoder
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::take,
    multi::count,
    number::complete::{le_f32, le_u32},
    sequence::tuple,
    IResult,
};
use thiserror::Error;

use crate::geometry::{Mesh, Triangle};

/// Ignored leading header
pub const HEADER_LEN: usize = 80;
/// Header plus the `u32` triangle count
pub const PREFIX_LEN: usize = HEADER_LEN + 4;
/// Normal, three vertices and the 2-byte attribute field
pub const RECORD_LEN: usize = 12 * 4 + 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("STL data too small: {actual} bytes, header and triangle count need 84")]
    TooShort { actual: usize },

    #[error("STL data truncated: {count} triangles need {expected} bytes, got {actual}")]
    Truncated { count: u32, expected: u64, actual: usize },

    #[error("STL triangle count {count} disagrees with data: expected {expected} bytes, got {actual}")]
    TrailingBytes { count: u32, expected: u64, actual: usize },
}

/// Decode a binary STL buffer into a mesh.
///
/// The declared triangle count must match the buffer length exactly; no
/// partially decoded mesh is ever returned.
pub fn decode(data: &[u8]) -> Result<Mesh, FormatError> {
    if data.len() < PREFIX_LEN {
        return Err(FormatError::TooShort { actual: data.len() });
    }

    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]);
    let expected = PREFIX_LEN as u64 + u64::from(declared) * RECORD_LEN as u64;
    let actual = data.len();

    if (actual as u64) < expected {
        return Err(FormatError::Truncated {
            count: declared,
            expected,
            actual,
        });
    }
    if (actual as u64) > expected {
        return Err(FormatError::TrailingBytes {
            count: declared,
            expected,
            actual,
        });
    }

    // Lengths are verified above, so a parser failure can only mean truncation
    let (_, triangles) = parse_binary_stl(data).map_err(|_| FormatError::Truncated {
        count: declared,
        expected,
        actual,
    })?;

    tracing::debug!(triangles = triangles.len(), "decoded binary STL");
    Ok(Mesh::new(triangles))
}

fn parse_binary_stl(input: &[u8]) -> IResult<&[u8], Vec<Triangle>> {
    let (input, _header) = take(HEADER_LEN)(input)?;
    let (input, triangle_count) = le_u32(input)?;
    count(parse_facet, triangle_count as usize)(input)
}

fn parse_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = parse_vector3(input)?;
    let (input, v0) = parse_vector3(input)?;
    let (input, v1) = parse_vector3(input)?;
    let (input, v2) = parse_vector3(input)?;
    // Attribute byte count
    let (input, _) = take(2usize)(input)?;

    Ok((
        input,
        Triangle::new(normal, Point3::from(v0), Point3::from(v1), Point3::from(v2)),
    ))
}

fn parse_vector3(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Serialize triangles in the binary layout `decode` reads
#[cfg(test)]
pub(crate) fn encode(triangles: &[Triangle]) -> Vec<u8> {
    let mut data = vec![0u8; HEADER_LEN];
    data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for t in triangles {
        let floats = t
            .normal
            .iter()
            .chain(t.vertices.iter().flat_map(|v| v.coords.iter()));
        for f in floats {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(&[0xAB, 0xCD]);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_triangles(n: usize) -> Vec<Triangle> {
        (0..n)
            .map(|i| {
                let f = i as f32;
                Triangle::new(
                    Vector3::new(-0.0, f32::MIN_POSITIVE, 1.0),
                    Point3::new(f, 1.0e-30, -f * 0.1),
                    Point3::new(f + 0.333_333, f32::MAX, 7.25),
                    Point3::new(-1.5e7, f * f, f32::EPSILON),
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = decode(&data).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.bounds().max_dimension(), 0.0);
    }

    #[test]
    fn test_decode_is_bit_identical() {
        let triangles = synthetic_triangles(17);
        let mesh = decode(&encode(&triangles)).unwrap();

        assert_eq!(mesh.triangle_count(), triangles.len());
        for (decoded, original) in mesh.triangles().iter().zip(&triangles) {
            for i in 0..3 {
                assert_eq!(decoded.normal[i].to_bits(), original.normal[i].to_bits());
                for v in 0..3 {
                    assert_eq!(
                        decoded.vertices[v][i].to_bits(),
                        original.vertices[v][i].to_bits()
                    );
                }
            }
        }
    }

    #[test]
    fn test_too_short() {
        assert_eq!(decode(&[0u8; 83]), Err(FormatError::TooShort { actual: 83 }));
        assert_eq!(decode(&[]), Err(FormatError::TooShort { actual: 0 }));
    }

    #[test]
    fn test_count_exceeds_records() {
        let mut data = encode(&synthetic_triangles(3));
        data[80..84].copy_from_slice(&4u32.to_le_bytes());

        assert_eq!(
            decode(&data),
            Err(FormatError::Truncated {
                count: 4,
                expected: 284,
                actual: 234,
            })
        );
    }

    #[test]
    fn test_record_cut_mid_way() {
        let mut data = encode(&synthetic_triangles(2));
        data.truncate(data.len() - 1);
        assert!(matches!(decode(&data), Err(FormatError::Truncated { count: 2, .. })));
    }

    #[test]
    fn test_count_below_records() {
        let mut data = encode(&synthetic_triangles(3));
        data[80..84].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            decode(&data),
            Err(FormatError::TrailingBytes { count: 2, .. })
        ));
    }

    #[test]
    fn test_huge_count_does_not_allocate() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&data), Err(FormatError::Truncated { .. })));
    }
}
