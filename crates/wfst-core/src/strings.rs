// Interning store for output-symbol strings (the string semiring).
//
// Determinization carries pending output as string ids. Identical strings are
// always interned to the same id, so ids can be compared directly.

use hashbrown::HashMap;

use crate::automaton::Symbol;

/// Handle of an interned symbol string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringId(u32);

impl StringId {
    /// The empty string, neutral element of concatenation.
    pub const EMPTY: StringId = StringId(0);

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbol string store with the string-semiring operations.
///
/// - multiplication is concatenation ([`StringStore::mult`])
/// - addition is the longest common prefix ([`StringStore::add`])
/// - division strips that common prefix ([`StringStore::dif`])
#[derive(Debug, Clone)]
pub struct StringStore {
    strings: Vec<Box<[Symbol]>>,
    index: HashMap<Box<[Symbol]>, StringId>,
    buf: Vec<Symbol>,
}

impl Default for StringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StringStore {
    pub fn new() -> Self {
        let empty: Box<[Symbol]> = Box::new([]);
        let mut index = HashMap::new();
        index.insert(empty.clone(), StringId::EMPTY);
        Self {
            strings: vec![empty],
            index,
            buf: Vec::new(),
        }
    }

    /// Number of distinct strings stored, the empty string included.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always `false`; the empty string is stored from the start.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Forget every string except the empty one.
    pub fn clear(&mut self) {
        self.strings.truncate(1);
        self.index.retain(|_, id| id.is_empty());
        self.buf.clear();
    }

    /// Intern a symbol sequence.
    pub fn store(&mut self, symbols: &[Symbol]) -> StringId {
        if let Some(&id) = self.index.get(symbols) {
            return id;
        }
        let id = StringId(self.strings.len() as u32);
        let owned: Box<[Symbol]> = symbols.into();
        self.strings.push(owned.clone());
        self.index.insert(owned, id);
        id
    }

    /// Intern a single-symbol string, or the empty string for epsilon.
    pub fn symbol(&mut self, symbol: Option<Symbol>) -> StringId {
        match symbol {
            Some(s) => self.store(&[s]),
            None => StringId::EMPTY,
        }
    }

    #[inline]
    pub fn get(&self, id: StringId) -> &[Symbol] {
        &self.strings[id.index()]
    }

    #[inline]
    pub fn string_len(&self, id: StringId) -> usize {
        self.strings[id.index()].len()
    }

    /// The symbol at `pos`, or `None` past the end of the string.
    #[inline]
    pub fn get_at(&self, id: StringId, pos: usize) -> Option<Symbol> {
        self.strings[id.index()].get(pos).copied()
    }

    /// Concatenation `a . b`.
    pub fn mult(&mut self, a: StringId, b: StringId) -> StringId {
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        buf.extend_from_slice(self.get(a));
        buf.extend_from_slice(self.get(b));
        let id = self.store(&buf);
        self.buf = buf;
        id
    }

    /// Longest common prefix of `a` and `b`.
    pub fn add(&mut self, a: StringId, b: StringId) -> StringId {
        if a == b {
            return a;
        }
        if a.is_empty() || b.is_empty() {
            return StringId::EMPTY;
        }
        let n = self.common_prefix_len(a, b);
        if n == 0 {
            return StringId::EMPTY;
        }
        if n == self.string_len(a) {
            return a;
        }
        if n == self.string_len(b) {
            return b;
        }
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        buf.extend_from_slice(&self.get(a)[..n]);
        let id = self.store(&buf);
        self.buf = buf;
        id
    }

    /// `a` with the longest common prefix of `a` and `b` removed.
    pub fn dif(&mut self, a: StringId, b: StringId) -> StringId {
        if a == b || a.is_empty() {
            return StringId::EMPTY;
        }
        if b.is_empty() {
            return a;
        }
        let n = self.common_prefix_len(a, b);
        if n == 0 {
            return a;
        }
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        buf.extend_from_slice(&self.get(a)[n..]);
        let id = self.store(&buf);
        self.buf = buf;
        id
    }

    fn common_prefix_len(&self, a: StringId, b: StringId) -> usize {
        self.get(a)
            .iter()
            .zip(self.get(b))
            .take_while(|(x, y)| x == y)
            .count()
    }
}
