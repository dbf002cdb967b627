use std::{iter::FusedIterator, mem};

use tracing::{debug, trace, warn};

use crate::{
    bits::BitsList,
    error::{MapError, Result},
    key::MapKey,
    primes::{MAX_CAPACITY, next_prime},
    store::ValueStore,
    token::{NULL_KEY_INDEX, Token},
};

/// Capacity of maps built with `new()`: the smallest prime above 64
pub const DEFAULT_CAPACITY: usize = 67;

/// Slots allocated the first time the link array is needed
const INITIAL_LINKS: usize = 16;

/// A hash map from primitive keys to values held in a [`ValueStore`].
///
/// All entries live in one backing array split into two regions that grow toward
/// each other:
///
/// - the **lo region** `[0, lo_len)` holds entries that joined an occupied bucket.
///   Each carries a link to the next entry of its collision chain.
/// - the **hi region** `[capacity - hi_len, capacity)` holds entries that landed in
///   an empty bucket. They carry no link and end their chain.
///
/// Removal keeps both regions dense by moving the region's outermost entry into the
/// vacated slot. A single optional entry for the "null key" lives outside the arrays.
///
/// Every structural change bumps a version; [`Token`]s stamped with an older version
/// are rejected by the checked accessors.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug, Clone)]
pub struct LoHiMap<K, S: ValueStore> {
    /// Bucket heads as 1-based entry indices, 0 for an empty bucket
    buckets: Vec<u32>,
    /// Next entry of each lo-region entry's chain
    links: Vec<u32>,
    /// Keys, one slot per entry position
    keys: Vec<K>,
    /// Values, parallel to `keys`
    values: S,
    /// Entries in the lo region
    lo_size: usize,
    /// Entries in the hi region
    hi_size: usize,
    /// Bumped on every structural mutation
    version: u32,
    /// Value mapped to the null key, if any
    null_value: Option<S::Value>,
}

/// Primitive keys to primitive values
pub type PrimitiveMap<K, V> = LoHiMap<K, Vec<V>>;
/// Primitive keys to fixed-width bit-packed values
pub type BitsMap<K> = LoHiMap<K, BitsList>;
/// `f64` keys to `i16` values
pub type DoubleShortMap = PrimitiveMap<f64, i16>;
/// `f64` keys to bit-packed values
pub type DoubleBitsMap = BitsMap<f64>;
/// `i32` keys to `i32` values
pub type IntIntMap = PrimitiveMap<i32, i32>;
/// `i64` keys to `i64` values
pub type LongLongMap = PrimitiveMap<i64, i64>;

/// A slot that points at a chain entry
#[derive(Debug, Clone, Copy)]
enum ChainRef {
    /// The bucket head
    Bucket(usize),
    /// The link of the lo-region entry at this index
    Link(usize),
}

/// Region an entry is compacted within
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Linked entries at the front of the arrays
    Lo,
    /// Unlinked entries at the back of the arrays
    Hi,
}

/// Occupancy and chain-length figures for a map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    /// Slots in the backing arrays
    pub capacity: usize,
    /// Entries in the lo region
    pub lo_len: usize,
    /// Entries in the hi region
    pub hi_len: usize,
    /// Buckets with at least one entry
    pub occupied_buckets: usize,
    /// Entries in the longest chain
    pub longest_chain: usize,
    /// Average entries per occupied bucket
    pub mean_chain_len: f64,
}

impl<K, V> Default for LoHiMap<K, Vec<V>>
where
    K: MapKey,
    V: Copy + Default + PartialEq + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LoHiMap<K, Vec<V>>
where
    K: MapKey,
    V: Copy + Default + PartialEq + std::fmt::Debug,
{
    /// Creates an empty map with [`DEFAULT_CAPACITY`]
    #[must_use]
    pub fn new() -> Self {
        Self::allocate(&Vec::new(), DEFAULT_CAPACITY)
    }

    /// Creates an empty map holding at least `capacity` entries before it grows.
    ///
    /// The capacity is rounded up to a prime, and to at least 2.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CapacityOverflow`] above [`MAX_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self::allocate(&Vec::new(), next_prime(capacity)?))
    }
}

impl<K: MapKey> LoHiMap<K, BitsList> {
    /// Creates an empty map whose values are `bits_per_item` wide.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidBitsPerItem`] unless `bits_per_item` is in `1..=64`,
    /// or [`MapError::CapacityOverflow`] above [`MAX_CAPACITY`].
    pub fn with_bits(bits_per_item: u8, capacity: usize) -> Result<Self> {
        let template = BitsList::new(bits_per_item, 0)?;
        Ok(Self::allocate(&template, next_prime(capacity)?))
    }

    /// Width of a stored value in bits
    #[must_use]
    pub fn bits_per_item(&self) -> u8 {
        self.values.bits_per_item()
    }
}

impl<K: MapKey, S: ValueStore> LoHiMap<K, S> {
    /// Builds an empty map of exactly `capacity` slots, values shaped like `template`
    fn allocate(template: &S, capacity: usize) -> Self {
        Self {
            buckets: vec![0; capacity],
            links: Vec::new(),
            keys: vec![K::default(); capacity],
            values: template.with_len(capacity),
            lo_size: 0,
            hi_size: 0,
            version: 0,
            null_value: None,
        }
    }

    /// Number of entries, the null-key entry included
    #[must_use]
    pub fn len(&self) -> usize {
        self.stored().saturating_add(usize::from(self.null_value.is_some()))
    }

    /// Returns true if the map holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in the backing arrays, also the bucket count
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Entries in the lo region
    #[must_use]
    pub fn lo_len(&self) -> usize {
        self.lo_size
    }

    /// Entries in the hi region
    #[must_use]
    pub fn hi_len(&self) -> usize {
        self.hi_size
    }

    /// Current version, bumped on every structural mutation
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Entries stored in the arrays
    #[allow(clippy::arithmetic_side_effects)]
    fn stored(&self) -> usize {
        self.lo_size + self.hi_size
    }

    /// First index of the hi region
    #[allow(clippy::arithmetic_side_effects)]
    fn hi_start(&self) -> usize {
        self.capacity() - self.hi_size
    }

    /// Lo entries always have a successor, hi entries end their chain
    fn is_hi(&self, index: usize) -> bool {
        index >= self.lo_size
    }

    /// Returns true if `index` holds a live entry
    fn is_live(&self, index: usize) -> bool {
        index < self.lo_size || (index >= self.hi_start() && index < self.capacity())
    }

    /// Most nodes any chain walk may visit
    #[allow(clippy::arithmetic_side_effects)]
    fn chain_limit(&self) -> usize {
        self.stored() + 1
    }

    /// Marks a structural mutation
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Fault raised when a chain walk runs off the rails
    fn corrupt(&self) -> MapError {
        let limit = self.chain_limit();
        warn!(limit, lo = self.lo_size, hi = self.hi_size, "collision chain walk failed");
        MapError::CorruptChain { limit }
    }

    /// Bucket owning `key`
    #[allow(clippy::arithmetic_side_effects, clippy::cast_sign_loss)]
    fn bucket_of(&self, key: &K) -> usize {
        (key.hash_code() & i32::MAX) as usize % self.buckets.len()
    }

    /// Head entry of `bucket`
    fn head(&self, bucket: usize) -> Option<usize> {
        self.buckets.get(bucket).and_then(|&head| (head as usize).checked_sub(1))
    }

    /// Key stored at `index`
    fn key_slot(&self, index: usize) -> Result<K> {
        self.keys.get(index).copied().ok_or_else(|| self.corrupt())
    }

    /// Link of the lo entry at `index`
    fn link(&self, index: usize) -> Result<usize> {
        self.links.get(index).map(|&next| next as usize).ok_or_else(|| self.corrupt())
    }

    /// Points `reference` at the entry `target`
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    fn repoint(&mut self, reference: ChainRef, target: usize) {
        let slot = match reference {
            ChainRef::Bucket(bucket) => self.buckets.get_mut(bucket).map(|slot| (slot, target + 1)),
            ChainRef::Link(index) => self.links.get_mut(index).map(|slot| (slot, target)),
        };
        if let Some((slot, value)) = slot {
            *slot = value as u32;
        }
    }

    /// Writes key and value into slot `index`
    fn write_entry(&mut self, index: usize, key: K, value: S::Value) {
        if let Some(slot) = self.keys.get_mut(index) {
            *slot = key;
        }
        self.values.store(index, value);
    }

    /// Index of `key`'s entry, if present
    fn find(&self, key: &K) -> Result<Option<usize>> {
        let Some(mut index) = self.head(self.bucket_of(key)) else {
            return Ok(None);
        };
        for _ in 0..self.chain_limit() {
            if self.key_slot(index)?.same_key(key) {
                return Ok(Some(index));
            }
            if self.is_hi(index) {
                return Ok(None);
            }
            index = self.link(index)?;
        }
        Err(self.corrupt())
    }

    /// Returns the value mapped to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CorruptChain`] if the collision chain is damaged.
    pub fn get(&self, key: &K) -> Result<Option<S::Value>> {
        Ok(self.find(key)?.and_then(|index| self.values.load(index)))
    }

    /// Returns true if `key` is mapped.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CorruptChain`] if the collision chain is damaged.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Returns true if any entry, the null-key entry included, maps to `value`
    #[must_use]
    pub fn contains_value(&self, value: S::Value) -> bool {
        self.iter().any(|(_, candidate)| candidate == value)
    }

    /// Maps `key` to `value`. Returns true if the key was new, false if its value was replaced.
    ///
    /// Replacing a value is not a structural change. A new key in a full table
    /// grows it to the next prime at twice its capacity first.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CapacityOverflow`] if the table cannot grow, or
    /// [`MapError::CorruptChain`] if the collision chain is damaged.
    pub fn put(&mut self, key: K, value: S::Value) -> Result<bool> {
        if let Some(index) = self.find(&key)? {
            self.values.store(index, value);
            return Ok(false);
        }
        if self.stored() == self.capacity() {
            self.grow()?;
        }
        self.insert_new(key, value);
        self.bump_version();
        Ok(true)
    }

    /// Places a key known to be absent. Callers guarantee a free slot.
    fn insert_new(&mut self, key: K, value: S::Value) {
        let bucket = self.bucket_of(&key);
        match self.head(bucket) {
            None => self.push_hi(bucket, key, value),
            Some(head) => self.push_lo(bucket, head, key, value),
        }
    }

    /// Lone entry of an empty bucket, placed at the low end of the hi region
    #[allow(clippy::arithmetic_side_effects)]
    fn push_hi(&mut self, bucket: usize, key: K, value: S::Value) {
        let index = self.hi_start() - 1;
        self.write_entry(index, key, value);
        self.repoint(ChainRef::Bucket(bucket), index);
        self.hi_size += 1;
    }

    /// New chain head linked to the previous head, placed at the end of the lo region
    #[allow(clippy::arithmetic_side_effects)]
    fn push_lo(&mut self, bucket: usize, head: usize, key: K, value: S::Value) {
        let index = self.lo_size;
        if self.links.len() <= index {
            let grown = (self.links.len() * 2).max(INITIAL_LINKS).min(self.capacity());
            self.links.resize(grown, 0);
        }
        self.write_entry(index, key, value);
        self.repoint(ChainRef::Link(index), head);
        self.repoint(ChainRef::Bucket(bucket), index);
        self.lo_size += 1;
    }

    /// Removes `key`. Returns true if it was present.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CorruptChain`] if the collision chain is damaged.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        let bucket = self.bucket_of(key);
        let Some(head) = self.head(bucket) else {
            return Ok(false);
        };

        if self.is_hi(head) {
            if !self.key_slot(head)?.same_key(key) {
                return Ok(false);
            }
            if let Some(slot) = self.buckets.get_mut(bucket) {
                *slot = 0;
            }
            self.compact(Region::Hi, head)?;
            self.bump_version();
            return Ok(true);
        }

        if self.key_slot(head)?.same_key(key) {
            let next = self.link(head)?;
            self.repoint(ChainRef::Bucket(bucket), next);
            self.compact(Region::Lo, head)?;
            self.bump_version();
            return Ok(true);
        }

        let mut before = ChainRef::Bucket(bucket);
        let mut prev = head;
        for _ in 0..self.chain_limit() {
            let next = self.link(prev)?;
            let matched = self.key_slot(next)?.same_key(key);

            if self.is_hi(next) {
                if !matched {
                    return Ok(false);
                }
                // prev takes over the terminal slot, its own lo slot is the one freed
                trace!(lo = prev, hi = next, "moving chain predecessor into hi terminal");
                let prev_key = self.key_slot(prev)?;
                if let Some(slot) = self.keys.get_mut(next) {
                    *slot = prev_key;
                }
                self.values.copy_slot(prev, next);
                self.repoint(before, next);
                self.compact(Region::Lo, prev)?;
                self.bump_version();
                return Ok(true);
            }

            if matched {
                let after = self.link(next)?;
                self.repoint(ChainRef::Link(prev), after);
                self.compact(Region::Lo, next)?;
                self.bump_version();
                return Ok(true);
            }

            before = ChainRef::Link(prev);
            prev = next;
        }
        Err(self.corrupt())
    }

    /// Shrinks `region` by one, filling the unlinked slot `freed` with the region's
    /// outermost entry
    #[allow(clippy::arithmetic_side_effects)]
    fn compact(&mut self, region: Region, freed: usize) -> Result<()> {
        let outermost = match region {
            Region::Lo => {
                self.lo_size -= 1;
                self.lo_size
            }
            Region::Hi => {
                let lowest = self.hi_start();
                self.hi_size -= 1;
                lowest
            }
        };
        if outermost != freed {
            self.move_entry(region, outermost, freed)?;
        }
        Ok(())
    }

    /// Relocates the entry at `src` to the free slot `dst` of the same region,
    /// repointing whatever referenced `src`
    fn move_entry(&mut self, region: Region, src: usize, dst: usize) -> Result<()> {
        let key = self.key_slot(src)?;
        let reference = self.reference_to(self.bucket_of(&key), src)?;
        self.repoint(reference, dst);
        if region == Region::Lo {
            let next = self.link(src)?;
            self.repoint(ChainRef::Link(dst), next);
        }
        if let Some(slot) = self.keys.get_mut(dst) {
            *slot = key;
        }
        self.values.copy_slot(src, dst);
        Ok(())
    }

    /// Finds the slot pointing at `target` within `bucket`'s chain
    fn reference_to(&self, bucket: usize, target: usize) -> Result<ChainRef> {
        let mut index = self.head(bucket).ok_or_else(|| self.corrupt())?;
        if index == target {
            return Ok(ChainRef::Bucket(bucket));
        }
        for _ in 0..self.chain_limit() {
            let next = self.link(index)?;
            if next == target {
                return Ok(ChainRef::Link(index));
            }
            index = next;
        }
        Err(self.corrupt())
    }

    /// Removes every entry, keeping the capacity
    pub fn clear(&mut self) {
        self.buckets.fill(0);
        self.lo_size = 0;
        self.hi_size = 0;
        self.null_value = None;
        self.bump_version();
        debug!(capacity = self.capacity(), "cleared");
    }

    /// Grows the capacity to hold at least `capacity` entries without resizing.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CapacityOverflow`] above [`MAX_CAPACITY`].
    pub fn ensure_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        let target = next_prime(capacity)?;
        self.resize(target);
        Ok(())
    }

    /// Shrinks the capacity toward `capacity`, rounded up to a prime.
    ///
    /// Does nothing if the rounded capacity is not smaller than the current one.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::TrimBelowLen`] if `capacity` is below [`len`](Self::len), or
    /// [`MapError::CapacityOverflow`] above [`MAX_CAPACITY`].
    pub fn trim(&mut self, capacity: usize) -> Result<()> {
        let len = self.len();
        if capacity < len {
            return Err(MapError::TrimBelowLen { requested: capacity, len });
        }
        let target = next_prime(capacity)?;
        if target < self.capacity() {
            self.resize(target);
        }
        Ok(())
    }

    /// Shrinks the capacity to the smallest prime that holds the current entries
    pub fn shrink_to_fit(&mut self) {
        if let Ok(target) = next_prime(self.len()) {
            if target < self.capacity() {
                self.resize(target);
            }
        }
    }

    /// Doubles the capacity, rounded up to a prime
    fn grow(&mut self) -> Result<()> {
        let capacity = self.capacity();
        if capacity >= MAX_CAPACITY {
            return Err(MapError::CapacityOverflow { requested: capacity.saturating_mul(2), max: MAX_CAPACITY });
        }
        let target = next_prime(capacity.saturating_mul(2).min(MAX_CAPACITY))?;
        self.resize(target);
        Ok(())
    }

    /// Reallocates every array at `capacity` and reinserts the live entries.
    /// `capacity` must hold all entries.
    #[allow(clippy::arithmetic_side_effects)]
    fn resize(&mut self, capacity: usize) {
        let old_capacity = self.capacity();
        let (lo_size, hi_size) = (self.lo_size, self.hi_size);
        let fresh_values = self.values.with_len(capacity);
        let keys = mem::replace(&mut self.keys, vec![K::default(); capacity]);
        let values = mem::replace(&mut self.values, fresh_values);
        self.buckets = vec![0; capacity];
        self.links = Vec::new();
        self.lo_size = 0;
        self.hi_size = 0;
        self.bump_version();

        // Entries are already unique, so they skip the lookup
        for index in (0..lo_size).chain(old_capacity - hi_size..old_capacity) {
            if let (Some(&key), Some(value)) = (keys.get(index), values.load(index)) {
                self.insert_new(key, value);
            }
        }
        debug!(old_capacity, capacity, entries = self.stored(), "resized");
    }

    /// Maps the null key to `value`. Returns true if the null key was new.
    pub fn put_null_key(&mut self, value: S::Value) -> bool {
        let added = self.null_value.replace(value).is_none();
        if added {
            self.bump_version();
        }
        added
    }

    /// Value mapped to the null key
    #[must_use]
    pub fn get_null_key(&self) -> Option<S::Value> {
        self.null_value
    }

    /// Returns true if the null key is mapped
    #[must_use]
    pub fn contains_null_key(&self) -> bool {
        self.null_value.is_some()
    }

    /// Unmaps the null key. Returns true if it was mapped.
    pub fn remove_null_key(&mut self) -> bool {
        let removed = self.null_value.take().is_some();
        if removed {
            self.bump_version();
        }
        removed
    }

    /// Token for the entry at `index`
    #[allow(clippy::cast_possible_truncation)]
    fn entry_token(&self, index: usize) -> Token {
        Token::new(self.version, index as u32)
    }

    /// Token for the null-key entry, or `INVALID` when there is none
    fn null_token(&self) -> Token {
        if self.null_value.is_some() { Token::new(self.version, NULL_KEY_INDEX) } else { Token::INVALID }
    }

    /// Accepts only live-version tokens
    fn check_token(&self, token: Token) -> Result<()> {
        if token.is_invalid() {
            return Err(MapError::InvalidToken);
        }
        if token.version() != self.version {
            return Err(MapError::StaleToken { token_version: token.version(), map_version: self.version });
        }
        Ok(())
    }

    /// Token of `key`'s entry, if present.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CorruptChain`] if the collision chain is damaged.
    pub fn token_of(&self, key: &K) -> Result<Option<Token>> {
        Ok(self.find(key)?.map(|index| self.entry_token(index)))
    }

    /// Token of the first entry, or [`Token::INVALID`] for an empty map
    #[must_use]
    pub fn token(&self) -> Token {
        self.next_index_unchecked(None).map_or_else(|| self.null_token(), |index| self.entry_token(index))
    }

    /// Token of the entry after `token`, or [`Token::INVALID`] past the last one.
    ///
    /// The null-key entry always comes last.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidToken`] for [`Token::INVALID`] and
    /// [`MapError::StaleToken`] if the map changed since `token` was issued.
    pub fn next_token(&self, token: Token) -> Result<Token> {
        self.check_token(token)?;
        if token.is_null_key() {
            return Ok(Token::INVALID);
        }
        Ok(self
            .next_index_unchecked(Some(token.index() as usize))
            .map_or_else(|| self.null_token(), |index| self.entry_token(index)))
    }

    /// Index of the entry after `cursor` (`None` starts from the beginning), skipping
    /// the gap between the regions. No version check; the null-key entry is not visited.
    #[must_use]
    pub fn next_index_unchecked(&self, cursor: Option<usize>) -> Option<usize> {
        let next = cursor.map_or(0, |index| index.saturating_add(1));
        if next < self.lo_size {
            return Some(next);
        }
        let next = next.max(self.hi_start());
        (next < self.capacity()).then_some(next)
    }

    /// Key at a live `index`, without a version check
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<K> {
        if self.is_live(index) { self.keys.get(index).copied() } else { None }
    }

    /// Value at a live `index`, without a version check
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<S::Value> {
        if self.is_live(index) { self.values.load(index) } else { None }
    }

    /// Key named by `token`, `None` for the null key.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidToken`] if `token` names no entry and
    /// [`MapError::StaleToken`] if the map changed since it was issued.
    pub fn key(&self, token: Token) -> Result<Option<K>> {
        self.check_token(token)?;
        if token.is_null_key() {
            return if self.null_value.is_some() { Ok(None) } else { Err(MapError::InvalidToken) };
        }
        self.key_at(token.index() as usize).map(Some).ok_or(MapError::InvalidToken)
    }

    /// Value named by `token`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidToken`] if `token` names no entry and
    /// [`MapError::StaleToken`] if the map changed since it was issued.
    pub fn value(&self, token: Token) -> Result<S::Value> {
        self.check_token(token)?;
        if token.is_null_key() {
            return self.null_value.ok_or(MapError::InvalidToken);
        }
        self.value_at(token.index() as usize).ok_or(MapError::InvalidToken)
    }

    /// Returns true if `token` names the null-key entry
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_null_key(&self, token: Token) -> bool {
        token.is_null_key()
    }

    /// Returns an iterator over `(key, value)` pairs, the null-key entry last as `(None, value)`
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, S> {
        Iter { map: self, cursor: None, stage: Stage::Entries, remaining: self.len() }
    }

    /// Entries in the chain starting at `head`
    #[allow(clippy::arithmetic_side_effects)]
    fn chain_len(&self, head: usize) -> Result<usize> {
        let mut index = head;
        for len in 1..=self.chain_limit() {
            if self.is_hi(index) {
                return Ok(len);
            }
            index = self.link(index)?;
        }
        Err(self.corrupt())
    }

    /// Region occupancy and chain-length figures.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CorruptChain`] if a collision chain is damaged.
    #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
    pub fn region_stats(&self) -> Result<RegionStats> {
        let mut occupied_buckets = 0;
        let mut longest_chain = 0;
        let mut total = 0;
        for bucket in 0..self.buckets.len() {
            if let Some(head) = self.head(bucket) {
                let len = self.chain_len(head)?;
                occupied_buckets += 1;
                longest_chain = longest_chain.max(len);
                total += len;
            }
        }
        let mean_chain_len = if occupied_buckets == 0 { 0.0 } else { total as f64 / occupied_buckets as f64 };
        Ok(RegionStats {
            capacity: self.capacity(),
            lo_len: self.lo_size,
            hi_len: self.hi_size,
            occupied_buckets,
            longest_chain,
            mean_chain_len,
        })
    }

    /// Verifies that both regions are dense and every live slot is reached exactly
    /// once from its own bucket, within `lo_len + 1` hops, with no duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Integrity`] describing the first violation found.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn check_integrity(&self) -> Result<()> {
        let violation = |message: String| Err(MapError::Integrity(message));
        if self.stored() > self.capacity() {
            return violation(format!(
                "lo {} + hi {} exceeds capacity {}",
                self.lo_size,
                self.hi_size,
                self.capacity()
            ));
        }
        if self.lo_size > self.links.len() {
            return violation(format!("lo {} exceeds link slots {}", self.lo_size, self.links.len()));
        }

        let mut seen = vec![false; self.capacity()];
        let mut reached = 0;
        for bucket in 0..self.buckets.len() {
            let Some(mut index) = self.head(bucket) else {
                continue;
            };
            let mut chain: Vec<K> = Vec::new();
            loop {
                if !self.is_live(index) {
                    return violation(format!("bucket {bucket} reaches dead slot {index}"));
                }
                if seen.get(index).copied().unwrap_or(true) {
                    return violation(format!("slot {index} reached twice"));
                }
                if let Some(flag) = seen.get_mut(index) {
                    *flag = true;
                }
                reached += 1;

                let key = self.key_slot(index)?;
                if self.bucket_of(&key) != bucket {
                    return violation(format!("slot {index} holds {key:?} outside its bucket {bucket}"));
                }
                if chain.iter().any(|other| other.same_key(&key)) {
                    return violation(format!("{key:?} stored twice in bucket {bucket}"));
                }
                chain.push(key);
                if chain.len() > self.lo_size + 1 {
                    return violation(format!("bucket {bucket} chain longer than {}", self.lo_size + 1));
                }

                if self.is_hi(index) {
                    break;
                }
                index = self.link(index)?;
            }
        }

        if reached != self.stored() {
            return violation(format!("{reached} slots reachable, {} live", self.stored()));
        }
        Ok(())
    }
}

/// Stops at the first entry that fails to insert, which can only be a
/// [`MapError::CapacityOverflow`]. The failure is logged and the remaining
/// entries are dropped. Use [`LoHiMap::put`] to observe the error.
impl<K, V> Extend<(K, V)> for LoHiMap<K, Vec<V>>
where
    K: MapKey,
    V: Copy + Default + PartialEq + std::fmt::Debug,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            if let Err(err) = self.put(key, value) {
                warn!(%err, "extend stopped early");
                break;
            }
        }
    }
}

/// Collects through [`Extend`], so collection stops at the first
/// [`MapError::CapacityOverflow`].
impl<K, V> FromIterator<(K, V)> for LoHiMap<K, Vec<V>>
where
    K: MapKey,
    V: Copy + Default + PartialEq + std::fmt::Debug,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Iteration stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Walking the lo then hi region
    Entries,
    /// The null-key entry is next
    NullKey,
    /// Nothing left
    Done,
}

/// Iterator over the entries of a [`LoHiMap`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, S: ValueStore> {
    /// The map being walked
    map: &'a LoHiMap<K, S>,
    /// Index of the last entry yielded
    cursor: Option<usize>,
    /// What comes next
    stage: Stage,
    /// Entries not yet yielded
    remaining: usize,
}

impl<K: MapKey, S: ValueStore> Iterator for Iter<'_, K, S> {
    type Item = (Option<K>, S::Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Entries => {
                    let Some(index) = self.map.next_index_unchecked(self.cursor) else {
                        self.stage = Stage::NullKey;
                        continue;
                    };
                    self.cursor = Some(index);
                    if let (Some(key), Some(value)) = (self.map.key_at(index), self.map.value_at(index)) {
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some((Some(key), value));
                    }
                }
                Stage::NullKey => {
                    self.stage = Stage::Done;
                    if let Some(value) = self.map.null_value {
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some((None, value));
                    }
                }
                Stage::Done => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: MapKey, S: ValueStore> ExactSizeIterator for Iter<'_, K, S> {}

impl<K: MapKey, S: ValueStore> FusedIterator for Iter<'_, K, S> {}

impl<'a, K: MapKey, S: ValueStore> IntoIterator for &'a LoHiMap<K, S> {
    type Item = (Option<K>, S::Value);
    type IntoIter = Iter<'a, K, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
