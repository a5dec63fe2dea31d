//! The trusted client: the only party that ever sees plaintext ids or data.

use std::collections::HashMap;

use rand::{Rng, RngCore};

use super::crypto::{KeyMaterial, SymmetricKey};
use super::{BlockData, BucketSlot, OramError, Server, BUCKET_SIZE, DATA_LEN, DUMMY_LEN, DUM_VAL};

/// First byte of a real entry's stored value, distinguishing it from a
/// dummy's sentinel-prefixed value while keeping both the same length.
const REAL_VALUE_PREFIX: u8 = b'1';
/// The dummy value plaintext: `DUM_VAL` repeated to match a real entry's
/// prefix-plus-payload length, i.e. the fixed string `"00000"`.
const DUMMY_VALUE: [u8; DATA_LEN + 1] = [DUM_VAL; DATA_LEN + 1];

#[derive(Debug, Clone)]
struct PositionEntry {
    leaf_id: u64,
    tag: Vec<u8>,
}

/// The trusted ORAM client: holds the symmetric keys and the position map.
///
/// The position map (`id -> (leaf, tag)`) is the one piece of state that
/// must never be handed to the server — it is what makes a future access
/// to the same id land on an unrelated-looking path.
pub struct Client {
    keys: KeyMaterial,
    positions: HashMap<u64, PositionEntry>,
}

impl Client {
    /// Generate fresh key material and an empty position map.
    pub fn new() -> Self {
        Self {
            keys: KeyMaterial::generate(),
            positions: HashMap::new(),
        }
    }

    /// Fill every bucket of `server` with [`BUCKET_SIZE`] dummy slots.
    /// `store_data` calls this automatically the first time it sees an
    /// uninitialized server, but it can also be called up front.
    pub fn initialize(&self, server: &mut Server) {
        for level in 0..=server.height() {
            for index in 0..server.num_nodes_in_level(level) {
                let bucket = (0..BUCKET_SIZE)
                    .map(|_| make_dummy_slot(&self.keys.enc))
                    .collect();
                server.node_at_mut(level, index).bucket = bucket;
            }
        }
    }

    /// Whether `id` currently has an entry in the position map.
    pub fn contains(&self, id: u64) -> bool {
        self.positions.contains_key(&id)
    }

    /// Store a new data block under `id`. Fails if `id` is already stored.
    pub fn store_data(
        &mut self,
        server: &mut Server,
        id: u64,
        data: BlockData,
    ) -> Result<(), OramError> {
        if self.positions.contains_key(&id) {
            return Err(OramError::AlreadyExists);
        }
        if !server.is_initialized() {
            self.initialize(server);
        }

        let tag = self.keys.mac.tag(id, &data);
        self.place_new_entry(server, id, data, tag)
    }

    /// Retrieve the data block stored under `id`, or `Ok(None)` if no such
    /// id has ever been stored, it was deleted, or the walk to its
    /// recorded leaf never turns it up.
    pub fn retrieve_data(
        &mut self,
        server: &mut Server,
        id: u64,
    ) -> Result<Option<BlockData>, OramError> {
        let entry = match self.positions.get(&id).cloned() {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let (found_at, value_plain) = self.scan_path(server, entry.leaf_id, id)?;
        let (level, index, slot_index) = match found_at {
            Some(location) => location,
            None => return Ok(None),
        };
        let value_plain = value_plain.expect("scan_path returns a value whenever it finds a slot");

        if value_plain.len() != DATA_LEN + 1 || value_plain[0] != REAL_VALUE_PREFIX {
            return Err(OramError::InvalidData);
        }
        let data_plain: BlockData = value_plain[1..]
            .try_into()
            .map_err(|_| OramError::InvalidData)?;

        if !self.keys.mac.verify(id, &data_plain, &entry.tag) {
            return Err(OramError::Corrupted);
        }

        server.node_at_mut(level, index).bucket[slot_index] = make_dummy_slot(&self.keys.enc);
        self.positions.remove(&id);

        self.place_new_entry(server, id, data_plain, entry.tag)?;
        Ok(Some(data_plain))
    }

    /// Delete the entry stored under `id`, returning its last known value,
    /// or `Ok(None)` if no such id has ever been stored (or it was already
    /// deleted, or the walk never turns it up).
    pub fn delete_data(
        &mut self,
        server: &mut Server,
        id: u64,
    ) -> Result<Option<BlockData>, OramError> {
        let entry = match self.positions.get(&id).cloned() {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let (found_at, value_plain) = self.scan_path(server, entry.leaf_id, id)?;
        let (level, index, slot_index) = match found_at {
            Some(location) => location,
            None => return Ok(None),
        };
        let value_plain = value_plain.expect("scan_path returns a value whenever it finds a slot");

        server.node_at_mut(level, index).bucket[slot_index] = make_dummy_slot(&self.keys.enc);
        self.positions.remove(&id);

        if value_plain.len() != DATA_LEN + 1 {
            return Ok(None);
        }
        let data_plain: BlockData = value_plain[1..].try_into().unwrap_or([0u8; DATA_LEN]);
        Ok(Some(data_plain))
    }

    /// Walk the path to `leaf_id`, stopping at the first slot whose
    /// decrypted key matches `id`.
    fn scan_path(
        &self,
        server: &Server,
        leaf_id: u64,
        id: u64,
    ) -> Result<(Option<(u32, usize, usize)>, Option<Vec<u8>>), OramError> {
        for level in 0..=server.height() {
            let index = server.index_at_depth(leaf_id, level);
            let bucket = &server.node_at(level, index).bucket;
            for (slot_index, slot) in bucket.iter().enumerate() {
                let key_plain = match self.keys.enc.decrypt(&slot.key_ct) {
                    Ok(plain) => plain,
                    Err(_) => continue,
                };
                if let Ok(candidate_id) = parse_id(&key_plain) {
                    if candidate_id == id {
                        let value = self.keys.enc.decrypt(&slot.val_ct)?;
                        return Ok((Some((level, index, slot_index)), Some(value)));
                    }
                }
            }
        }
        Ok((None, None))
    }

    /// Assign a fresh random leaf, place `(id, data)` at the root, re-encrypt
    /// the root bucket, and run a push-down pass.
    fn place_new_entry(
        &mut self,
        server: &mut Server,
        id: u64,
        data: BlockData,
        tag: Vec<u8>,
    ) -> Result<(), OramError> {
        let leaf_id = random_leaf(server);
        self.positions.insert(id, PositionEntry { leaf_id, tag });

        let mut value_plain = [0u8; DATA_LEN + 1];
        value_plain[0] = REAL_VALUE_PREFIX;
        value_plain[1..].copy_from_slice(&data);

        let key_ct = self.keys.enc.encrypt(id.to_string().as_bytes())?;
        let val_ct = self.keys.enc.encrypt(&value_plain)?;
        self.insert_at_root(server, BucketSlot::new(key_ct, val_ct))?;
        self.reencrypt_root(server)?;
        self.push_down(server)?;
        Ok(())
    }

    /// Place `slot` into the root bucket, evicting the first dummy found.
    fn insert_at_root(&self, server: &mut Server, slot: BucketSlot) -> Result<(), OramError> {
        let mut bucket = server.root().bucket.clone();
        replace_a_dummy(&mut bucket, slot, &self.keys.enc)?;
        server.root_mut().bucket = bucket;
        Ok(())
    }

    /// Re-encrypt every slot in the root bucket under a fresh nonce, so a
    /// newly-inserted entry's ciphertext is no more "fresh-looking" than
    /// its neighbours.
    fn reencrypt_root(&self, server: &mut Server) -> Result<(), OramError> {
        let mut bucket = server.root().bucket.clone();
        for slot in bucket.iter_mut() {
            let key_plain = self.keys.enc.decrypt(&slot.key_ct)?;
            let val_plain = self.keys.enc.decrypt(&slot.val_ct)?;
            slot.key_ct = self.keys.enc.encrypt(&key_plain)?;
            slot.val_ct = self.keys.enc.encrypt(&val_plain)?;
        }
        server.root_mut().bucket = bucket;
        Ok(())
    }

    /// One eviction pass: at the root, one node; at every other level, two
    /// distinct nodes; from each selected node, two distinct slots are
    /// each offered a chance to move one level closer to their own
    /// recorded leaf.
    fn push_down(&mut self, server: &mut Server) -> Result<(), OramError> {
        let height = server.height();
        for level in 0..height {
            let node_indices: Vec<usize> = if level == 0 {
                vec![0]
            } else {
                let (a, b) = two_distinct(server.num_nodes_in_level(level));
                vec![a, b]
            };

            for node_index in node_indices {
                let (slot_a, slot_b) = two_distinct(BUCKET_SIZE);
                self.evict_slot(server, level, node_index, slot_a)?;
                self.evict_slot(server, level, node_index, slot_b)?;
            }
        }
        Ok(())
    }

    /// Move the entry at `(level, node_index, slot_index)` into whichever
    /// child it is headed toward, if that child has a dummy slot to give
    /// up. Leaves the parent slot untouched when the child has no room —
    /// dropping a real entry there would be silent data loss.
    fn evict_slot(
        &mut self,
        server: &mut Server,
        level: u32,
        node_index: usize,
        slot_index: usize,
    ) -> Result<(), OramError> {
        let slot = server.node_at(level, node_index).bucket[slot_index].clone();
        let value = self.keys.enc.decrypt(&slot.val_ct)?;

        let direction = if slot_is_dummy(&value) {
            Direction::random()
        } else {
            let key_plain = self.keys.enc.decrypt(&slot.key_ct)?;
            match parse_id(&key_plain).ok().and_then(|id| self.positions.get(&id)) {
                Some(entry) => Direction::from_bit(server.path_bits(entry.leaf_id)[level as usize]),
                None => Direction::random(),
            }
        };

        let child_index = node_index * 2 + direction.as_index();
        let mut child_bucket = server.node_at(level + 1, child_index).bucket.clone();
        if let Some(dummy_position) = child_bucket
            .iter()
            .position(|candidate| bucket_slot_is_dummy(candidate, &self.keys.enc))
        {
            child_bucket[dummy_position] = slot;
            server.node_at_mut(level + 1, child_index).bucket = child_bucket;
            server.node_at_mut(level, node_index).bucket[slot_index] =
                make_dummy_slot(&self.keys.enc);
        }

        Ok(())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Which child a bucket entry is headed toward. Kept as its own type so
/// direction is never compared as a raw string or integer — the source's
/// push-down mixed path bits (strings) with an integer `0` and relied on
/// the two happening to compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

impl Direction {
    fn from_bit(bit: u8) -> Self {
        if bit == 0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    fn random() -> Self {
        Self::from_bit(rand::thread_rng().gen_range(0u8..2))
    }

    fn as_index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
        }
    }
}

fn random_leaf(server: &Server) -> u64 {
    rand::thread_rng().gen_range(server.leaf_min()..=server.leaf_max())
}

/// Two distinct indices in `0..n`, or `(0, 0)` if `n <= 1`.
fn two_distinct(n: usize) -> (usize, usize) {
    if n <= 1 {
        return (0, 0);
    }
    let mut rng = rand::thread_rng();
    let first = rng.gen_range(0..n);
    let mut second = rng.gen_range(0..n);
    while second == first {
        second = rng.gen_range(0..n);
    }
    (first, second)
}

fn make_dummy_slot(enc: &SymmetricKey) -> BucketSlot {
    let mut key_plain = [0u8; DUMMY_LEN];
    rand::thread_rng().fill_bytes(&mut key_plain);

    let key_ct = enc
        .encrypt(&key_plain)
        .expect("encrypting a fixed-length dummy key cannot fail");
    let val_ct = enc
        .encrypt(&DUMMY_VALUE)
        .expect("encrypting a fixed-length dummy value cannot fail");
    BucketSlot::new(key_ct, val_ct)
}

fn slot_is_dummy(value_plain: &[u8]) -> bool {
    value_plain.first() == Some(&DUM_VAL)
}

fn parse_id(key_plain: &[u8]) -> Result<u64, OramError> {
    std::str::from_utf8(key_plain)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(OramError::InvalidData)
}

fn bucket_slot_is_dummy(slot: &BucketSlot, enc: &SymmetricKey) -> bool {
    enc.decrypt(&slot.val_ct)
        .map(|plain| slot_is_dummy(&plain))
        .unwrap_or(false)
}

fn replace_a_dummy(
    bucket: &mut Vec<BucketSlot>,
    new_slot: BucketSlot,
    enc: &SymmetricKey,
) -> Result<(), OramError> {
    if let Some(position) = bucket.iter().position(|slot| bucket_slot_is_dummy(slot, enc)) {
        bucket[position] = new_slot;
    } else if bucket.len() < BUCKET_SIZE {
        bucket.push(new_slot);
    } else {
        return Err(OramError::Crypto(
            "root bucket has no room for a new entry".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_pair(leaves: u64) -> (Client, Server) {
        let client = Client::new();
        let server = Server::new(leaves);
        (client, server)
    }

    #[test]
    fn store_then_retrieve_round_trips() {
        let (mut client, mut server) = fresh_pair(16);
        client.store_data(&mut server, 1, *b"abcd").unwrap();
        let got = client.retrieve_data(&mut server, 1).unwrap();
        assert_eq!(got, Some(*b"abcd"));
    }

    #[test]
    fn store_auto_initializes_an_uninitialized_server() {
        let (mut client, mut server) = fresh_pair(8);
        assert!(!server.is_initialized());
        client.store_data(&mut server, 1, *b"abcd").unwrap();
        assert!(server.is_initialized());
    }

    #[test]
    fn retrieving_unknown_id_returns_none() {
        let (mut client, mut server) = fresh_pair(16);
        assert_eq!(client.retrieve_data(&mut server, 99).unwrap(), None);
    }

    #[test]
    fn duplicate_store_is_rejected() {
        let (mut client, mut server) = fresh_pair(16);
        client.store_data(&mut server, 1, *b"abcd").unwrap();
        assert!(matches!(
            client.store_data(&mut server, 1, *b"wxyz"),
            Err(OramError::AlreadyExists)
        ));
    }

    #[test]
    fn delete_returns_and_removes_entry() {
        let (mut client, mut server) = fresh_pair(16);
        client.store_data(&mut server, 1, *b"abcd").unwrap();
        assert_eq!(client.delete_data(&mut server, 1).unwrap(), Some(*b"abcd"));
        assert!(!client.contains(1));
        assert_eq!(client.retrieve_data(&mut server, 1).unwrap(), None);
    }

    #[test]
    fn delete_unknown_id_returns_none() {
        let (mut client, mut server) = fresh_pair(16);
        assert_eq!(client.delete_data(&mut server, 42).unwrap(), None);
    }

    #[test]
    fn many_ids_survive_interleaved_access() {
        let (mut client, mut server) = fresh_pair(64);
        for id in 0..20u64 {
            let data = [id as u8; DATA_LEN];
            client.store_data(&mut server, id, data).unwrap();
        }
        for id in 0..20u64 {
            let data = [id as u8; DATA_LEN];
            assert_eq!(client.retrieve_data(&mut server, id).unwrap(), Some(data));
        }
        for id in (0..20u64).step_by(2) {
            assert!(client.delete_data(&mut server, id).unwrap().is_some());
        }
        for id in (0..20u64).step_by(2) {
            assert_eq!(client.retrieve_data(&mut server, id).unwrap(), None);
        }
        for id in (1..20u64).step_by(2) {
            let data = [id as u8; DATA_LEN];
            assert_eq!(client.retrieve_data(&mut server, id).unwrap(), Some(data));
        }
    }
}
