use crate::models::driver::Coordinate;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Roughly 40 m cells.
pub const DEFAULT_PRECISION: usize = 8;

/// Encodes a validated coordinate as a base32 geohash of `precision` characters.
pub fn encode(coordinate: &Coordinate, precision: usize) -> String {
    let (mut lat_min, mut lat_max) = (-90.0_f64, 90.0_f64);
    let (mut lng_min, mut lng_max) = (-180.0_f64, 180.0_f64);

    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bit = 0;
    let mut index = 0usize;

    while hash.len() < precision {
        if even_bit {
            let mid = (lng_min + lng_max) / 2.0;
            if coordinate.lng >= mid {
                index = (index << 1) | 1;
                lng_min = mid;
            } else {
                index <<= 1;
                lng_max = mid;
            }
        } else {
            let mid = (lat_min + lat_max) / 2.0;
            if coordinate.lat >= mid {
                index = (index << 1) | 1;
                lat_min = mid;
            } else {
                index <<= 1;
                lat_max = mid;
            }
        }
        even_bit = !even_bit;

        bit += 1;
        if bit == 5 {
            hash.push(BASE32[index] as char);
            bit = 0;
            index = 0;
        }
    }

    hash
}
