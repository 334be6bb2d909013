use super::*;

/// Hands out extranonce1 values that are unique for the lifetime of the process.
#[derive(Debug)]
pub(crate) struct Extranonces {
    enonce1_size: usize,
    enonce2_size: usize,
    issued: Mutex<HashSet<Vec<u8>>>,
}

impl Extranonces {
    const MAX_DRAWS: usize = 1024;

    pub(crate) fn new(enonce1_size: usize, enonce2_size: usize) -> Result<Self> {
        ensure!(
            enonce1_size >= MIN_ENONCE_SIZE,
            "enonce1_size {} below minimum {}",
            enonce1_size,
            MIN_ENONCE_SIZE
        );
        ensure!(
            enonce1_size <= MAX_ENONCE_SIZE,
            "enonce1_size {} exceeds maximum {}",
            enonce1_size,
            MAX_ENONCE_SIZE
        );
        ensure!(
            enonce2_size >= MIN_ENONCE_SIZE,
            "enonce2_size {} below minimum {}",
            enonce2_size,
            MIN_ENONCE_SIZE
        );
        ensure!(
            enonce2_size <= MAX_ENONCE_SIZE,
            "enonce2_size {} exceeds maximum {}",
            enonce2_size,
            MAX_ENONCE_SIZE
        );

        Ok(Self {
            enonce1_size,
            enonce2_size,
            issued: Mutex::new(HashSet::new()),
        })
    }

    #[cfg(test)]
    pub(crate) fn enonce1_size(&self) -> usize {
        self.enonce1_size
    }

    pub(crate) fn enonce2_size(&self) -> usize {
        self.enonce2_size
    }

    pub(crate) fn allocate(&self) -> Result<Extranonce, PoolError> {
        let mut issued = self.issued.lock();

        for _ in 0..Self::MAX_DRAWS {
            let candidate = Extranonce::random(self.enonce1_size);

            if issued.insert(candidate.as_bytes().to_vec()) {
                return Ok(candidate);
            }
        }

        Err(PoolError::state(format!(
            "no unused extranonce1 after {} draws ({} issued)",
            Self::MAX_DRAWS,
            issued.len()
        )))
    }

    #[cfg(test)]
    pub(crate) fn issued(&self) -> usize {
        self.issued.lock().len()
    }
}
