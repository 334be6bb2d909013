use super::*;

/// Sibling hashes that fold a coinbase digest into the block merkle root. `txids` must already be in
/// internal byte order.
pub fn merkle_steps(txids: &[[u8; 32]]) -> Vec<[u8; 32]> {
    let mut steps = Vec::new();

    let mut level = Vec::with_capacity(txids.len() + 1);
    level.push(None);
    level.extend(txids.iter().copied().map(Some));

    while level.len() > 1 {
        if let Some(step) = level[1] {
            steps.push(step);
        }

        if level.len() % 2 != 0 {
            level.push(level[level.len() - 1]);
        }

        let mut next = Vec::with_capacity(level.len() / 2);
        next.push(None);

        for pair in level[2..].chunks(2) {
            if let [Some(left), Some(right)] = pair {
                next.push(Some(hash_pair(left, right)));
            }
        }

        level = next;
    }

    steps
}

pub fn fold_merkle_root(coinbase_hash: [u8; 32], steps: &[[u8; 32]]) -> [u8; 32] {
    steps
        .iter()
        .fold(coinbase_hash, |root, step| hash_pair(&root, step))
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    codec::sha256d(&buf)
}
