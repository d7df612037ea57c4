//! Exponential ElGamal over the RFC 5114 §2.2 MODP group
//!
//! 2048-bit prime modulus with a 224-bit prime-order subgroup generated by `g`.
//! Ciphers carry two components; both live in the order-q subgroup.

use super::random::{random_nonzero_below, secure_rng};
use super::scheme::{HomomorphicScheme, SecretScheme};
use crate::error::{ProtocolError, Result};
use num_bigint::BigUint;

const PRIME_HEX: &str = "AD107E1E9123A9D0D660FAA79559C51FA20D64E5683B9FD1B54B1597B61D0A75E6FA141DF95A56DBAF9A3C407BA1DF15EB3D688A309C180E1DE6B85A1274A0A66D3F8152AD6AC2129037C9EDEFDA4DF8D91E8FEF55B7394B7AD5B7D0B6C12207C9F98D11ED34DBF6C6BA0B2C8BBC27BE6A00E0A0B9C49708B3BF8A317091883681286130BC8985DB1602E714415D9330278273C7DE31EFDC7310F7121FD5A07415987D9ADC0A486DCDF93ACC44328387315D75E198C641A480CD86A1B9E587E8BE60E69CC928B2B9C52172E413042E9B23F10B0E16E79763C9B53DCF4BA80A29E3FB73C16B8E75B97EF363E2FFA31F71CF9DE5384E71B81C0AC4DFFE0C10E64F";
const GENERATOR_HEX: &str = "AC4032EF4F2D9AE39DF30B5C8FFDAC506CDEBE7B89998CAF74866A08CFE4FFE3A6824A4E10B9A6F0DD921F01A70C4AFAAB739D7700C29F52C57DB17C620A8652BE5E9001A8D66AD7C17669101999024AF4D027275AC1348BB8A762D0521BC98AE247150422EA1ED409939D54DA7460CDB5F6C6B250717CBEF180EB34118E98D119529A45D6F834566E3025E316A330EFBB77A86F0C1AB15B051AE3D428C8F8ACB70A8137150B8EEB10E183EDD19963DDD9E263E4770589EF6AA21E7F5F2FF381B539CCE3409D13CD566AFBB48D6C019181E1BCFE94B30269EDFE72FE9B6AA4BD7B5A0F1C71CFFF4C19C418E1F6EC017981BC087F2A7065B384B890D3191F2BFA";
const ORDER_HEX: &str = "801C0D34C58D93FE997177101F80535A4738CEBCBF389A99B36371EB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModpCipher {
    pub c1: BigUint,
    pub c2: BigUint,
}

pub struct ModpElGamal {
    p: BigUint,
    g: BigUint,
    q: BigUint,
    y: BigUint,
    x: BigUint,
    width: usize,
}

fn parse_hex(hex: &str) -> Result<BigUint> {
    BigUint::parse_bytes(hex.as_bytes(), 16)
        .ok_or_else(|| ProtocolError::Config(format!("invalid group constant {}", &hex[..8])))
}

impl ModpElGamal {
    fn encrypt_exponent(&self, exponent: &BigUint) -> Result<ModpCipher> {
        let mut rng = secure_rng()?;
        let k = random_nonzero_below(&self.q, &mut rng);
        let c1 = self.g.modpow(&k, &self.p);
        let shared = self.y.modpow(&k, &self.p);
        let c2 = shared * self.g.modpow(exponent, &self.p) % &self.p;
        Ok(ModpCipher { c1, c2 })
    }

    /// Fermat inverse, valid for any non-zero residue
    fn inverse(&self, value: &BigUint) -> BigUint {
        let exponent = &self.p - BigUint::from(2u8);
        value.modpow(&exponent, &self.p)
    }

    fn encode(&self, value: &BigUint, out: &mut Vec<u8>) {
        let bytes = value.to_bytes_be();
        out.extend(std::iter::repeat(0u8).take(self.width.saturating_sub(bytes.len())));
        out.extend_from_slice(&bytes);
    }
}

impl HomomorphicScheme for ModpElGamal {
    type Cipher = ModpCipher;

    fn name(&self) -> &'static str {
        "modp-elgamal"
    }

    fn encrypt(&self, plaintext: &BigUint) -> Result<ModpCipher> {
        self.encrypt_exponent(&(plaintext % &self.q))
    }

    fn encrypt_inverse(&self, plaintext: &BigUint) -> Result<ModpCipher> {
        let reduced = plaintext % &self.q;
        self.encrypt_exponent(&((&self.q - reduced) % &self.q))
    }

    fn mult_ciphers(&self, a: &ModpCipher, b: &ModpCipher) -> ModpCipher {
        ModpCipher {
            c1: &a.c1 * &b.c1 % &self.p,
            c2: &a.c2 * &b.c2 % &self.p,
        }
    }

    fn hide_cipher_with_r(&self, cipher: &ModpCipher, r: &BigUint) -> ModpCipher {
        ModpCipher {
            c1: cipher.c1.modpow(r, &self.p),
            c2: cipher.c2.modpow(r, &self.p),
        }
    }

    fn invert_cipher(&self, cipher: &ModpCipher) -> ModpCipher {
        ModpCipher {
            c1: self.inverse(&cipher.c1),
            c2: self.inverse(&cipher.c2),
        }
    }

    fn group_order(&self) -> BigUint {
        self.q.clone()
    }

    fn cipher_bytes(&self, cipher: &ModpCipher) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 * self.width);
        self.encode(&cipher.c1, &mut out);
        self.encode(&cipher.c2, &mut out);
        out
    }
}

impl SecretScheme for ModpElGamal {
    fn setup() -> Result<Self> {
        let p = parse_hex(PRIME_HEX)?;
        let g = parse_hex(GENERATOR_HEX)?;
        let q = parse_hex(ORDER_HEX)?;
        let mut rng = secure_rng()?;
        let x = random_nonzero_below(&q, &mut rng);
        let y = g.modpow(&x, &p);
        let width = (p.bits() as usize + 7) / 8;
        Ok(Self { p, g, q, y, x, width })
    }

    fn is_zero(&self, cipher: &ModpCipher) -> bool {
        cipher.c1.modpow(&self.x, &self.p) == cipher.c2
    }
}
