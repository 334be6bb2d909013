use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Authorize {
    pub username: String,
    pub password: Option<String>,
}

impl Serialize for Authorize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(None)?;
        seq.serialize_element(&self.username)?;
        if let Some(password) = &self.password {
            seq.serialize_element(password)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Authorize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Username((String,)),
            WithPassword((String, Option<String>)),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Username((username,)) => Authorize {
                username,
                password: None,
            },
            Raw::WithPassword((username, password)) => Authorize { username, password },
        })
    }
}
