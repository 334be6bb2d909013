use super::*;

macro_rules! hex_word {
    ($name:ident, $what:literal) => {
        #[doc = concat!("A 4-byte ", $what, " carried on the wire as 8 big-endian hex characters.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
        pub struct $name(u32);

        impl $name {
            pub fn to_be_bytes(self) -> [u8; 4] {
                self.0.to_be_bytes()
            }
        }

        impl FromStr for $name {
            type Err = InternalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != 8 {
                    return Err(InternalError::InvalidLength {
                        expected: 8,
                        actual: s.len(),
                    });
                }

                u32::from_str_radix(s, 16)
                    .map(Self)
                    .map_err(|err| InternalError::Parse {
                        message: format!(concat!("invalid ", $what, " `{}`: {}"), s, err),
                    })
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{:08x}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(n: u32) -> Self {
                Self(n)
            }
        }

        impl From<$name> for u32 {
            fn from(n: $name) -> u32 {
                n.0
            }
        }
    };
}

hex_word!(Nonce, "nonce");
hex_word!(Ntime, "ntime");
hex_word!(Version, "version");
