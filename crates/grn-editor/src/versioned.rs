// -------------------------------------------------------------------
// Versioned
// -------------------------------------------------------------------

/// A value with a counter bumped on every mutable access, so derived data
/// can tell whether it is stale without comparing contents.
#[derive(Debug, Default)]
pub struct Versioned<T> {
    version: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { version: 0, data }
    }

    pub fn get(&self) -> &T {
        &self.data
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.version = self.version.wrapping_add(1);
        &mut self.data
    }

    /// Swap in a new value, returning the old one.
    pub fn replace(&mut self, data: T) -> T {
        self.version = self.version.wrapping_add(1);
        std::mem::replace(&mut self.data, data)
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

// -------------------------------------------------------------------
// Memoized
// -------------------------------------------------------------------

/// A value derived from `S`, recomputed only when the key extracted from
/// `S` changes.
pub struct Memoized<S, K, V> {
    recomputations: u64,
    cached: Option<(K, V)>,
    get_key: Box<dyn Fn(&S) -> K>,
    calc: Box<dyn Fn(&S) -> V>,
}

impl<S, K, V> Memoized<S, K, V>
where
    K: PartialEq,
{
    pub fn new(
        get_key: impl Fn(&S) -> K + 'static,
        calc: impl Fn(&S) -> V + 'static,
    ) -> Self {
        Self {
            recomputations: 0,
            cached: None,
            get_key: Box::new(get_key),
            calc: Box::new(calc),
        }
    }

    pub fn get<'a>(&'a mut self, source: &S) -> &'a V {
        let key = (self.get_key)(source);
        let entry = match self.cached.take() {
            Some((cached_key, value)) if cached_key == key => (cached_key, value),
            _ => {
                self.recomputations = self.recomputations.wrapping_add(1);
                let value = (self.calc)(source);
                (key, value)
            }
        };
        &self.cached.insert(entry).1
    }

    /// Drop the cached value; the next `get` recomputes.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many times the value has been computed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
