use std::{
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::types::{Injectable, Instance, TypeInfo};

/// Identifies a dependency.
///
/// Variants never collide with each other, a key `"Foo"` is not the class `Foo`
/// and not a symbol described as `"Foo"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Plain text key
    Key(Arc<str>),
    /// Nominal type tag
    Class(ClassToken),
    /// Opaque unique symbol
    Symbol(SymbolToken),
}

impl Token {
    pub fn key(key: impl Into<Arc<str>>) -> Token {
        Token::Key(key.into())
    }

    /// Token for `T` which can't be built without a binding
    pub fn class<T: Injectable>() -> Token {
        Token::Class(ClassToken {
            info: TypeInfo::of::<T>(),
            construct: None,
        })
    }

    /// Token for `T` which falls back to `T::default()` when nothing is bound
    pub fn constructible<T: Injectable + Default>() -> Token {
        Token::Class(ClassToken {
            info: TypeInfo::of::<T>(),
            construct: Some(|| Instance::new(T::default())),
        })
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Key(key) => f.write_str(key),
            Token::Class(class) => f.write_str(class.info.type_name),
            Token::Symbol(symbol) => write!(f, "Symbol({})", symbol.description),
        }
    }
}

impl From<&str> for Token {
    fn from(key: &str) -> Self {
        Token::key(key)
    }
}

impl From<String> for Token {
    fn from(key: String) -> Self {
        Token::key(key)
    }
}

impl From<&Token> for Token {
    fn from(token: &Token) -> Self {
        token.clone()
    }
}

/// A class reference - identity is the type, the constructor only matters for the fallback
#[derive(Clone, Copy)]
pub struct ClassToken {
    pub info: TypeInfo,
    pub(crate) construct: Option<fn() -> Instance>,
}

impl ClassToken {
    pub fn is_constructible(&self) -> bool {
        self.construct.is_some()
    }
}

impl PartialEq for ClassToken {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}
impl Eq for ClassToken {}
impl Hash for ClassToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.hash(state);
    }
}
impl Debug for ClassToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassToken")
            .field("type_name", &self.info.type_name)
            .field("constructible", &self.is_constructible())
            .finish()
    }
}

/// Type erased half of [Symbol]
#[derive(Debug, Clone)]
pub struct SymbolToken {
    id: u64,
    pub description: Arc<str>,
}

impl PartialEq for SymbolToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for SymbolToken {}
impl Hash for SymbolToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A unique token, tagged with the type bound under it.
///
/// Two symbols are never equal, even with the same description.
pub struct Symbol<T> {
    token: SymbolToken,
    _bound: PhantomData<fn() -> T>,
}

impl<T> Symbol<T> {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Symbol {
            token: SymbolToken {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                description: description.into(),
            },
            _bound: PhantomData,
        }
    }

    pub fn token(&self) -> Token {
        Token::Symbol(self.token.clone())
    }
}

impl<T> Clone for Symbol<T> {
    fn clone(&self) -> Self {
        Symbol {
            token: self.token.clone(),
            _bound: PhantomData,
        }
    }
}

impl<T> Debug for Symbol<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Symbol").field(&self.token.description).finish()
    }
}

impl<T> From<&Symbol<T>> for Token {
    fn from(symbol: &Symbol<T>) -> Self {
        symbol.token()
    }
}

impl<T> From<Symbol<T>> for Token {
    fn from(symbol: Symbol<T>) -> Self {
        Token::Symbol(symbol.token)
    }
}

/// Discriminates between several bindings of one token
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Qualifier {
    /// Used whenever no qualifier was given - never equal to any named one, not even `""`
    #[default]
    Default,
    Named(Arc<str>),
}

impl Qualifier {
    pub fn is_default(&self) -> bool {
        matches!(self, Qualifier::Default)
    }
}

impl Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::Default => f.write_str("<default>"),
            Qualifier::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Qualifier {
    fn from(name: &str) -> Self {
        Qualifier::Named(name.into())
    }
}

impl From<String> for Qualifier {
    fn from(name: String) -> Self {
        Qualifier::Named(name.into())
    }
}

impl From<Option<&str>> for Qualifier {
    fn from(name: Option<&str>) -> Self {
        name.map_or(Qualifier::Default, Qualifier::from)
    }
}

/// The qualifiers one binding is provided under.
///
/// Duplicates are dropped, first occurrence wins. No qualifiers means the default one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers(Vec<Arc<str>>);

impl Qualifiers {
    pub fn none() -> Self {
        Qualifiers(Vec::new())
    }

    /// The explicit qualifiers, in registration order
    pub fn as_slice(&self) -> &[Arc<str>] {
        &self.0
    }

    /// Table keys this binding occupies
    pub(crate) fn keys(&self) -> Vec<Qualifier> {
        if self.0.is_empty() {
            return vec![Qualifier::Default];
        }
        self.0.iter().cloned().map(Qualifier::Named).collect()
    }
}

impl<S: Into<Arc<str>>> FromIterator<S> for Qualifiers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<Arc<str>> = Vec::new();
        for name in iter {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Qualifiers(names)
    }
}

impl From<&str> for Qualifiers {
    fn from(name: &str) -> Self {
        Qualifiers(vec![name.into()])
    }
}

impl From<String> for Qualifiers {
    fn from(name: String) -> Self {
        Qualifiers(vec![name.into()])
    }
}

impl From<Qualifier> for Qualifiers {
    fn from(qualifier: Qualifier) -> Self {
        match qualifier {
            Qualifier::Default => Qualifiers::none(),
            Qualifier::Named(name) => Qualifiers(vec![name]),
        }
    }
}

impl<const N: usize> From<[&str; N]> for Qualifiers {
    fn from(names: [&str; N]) -> Self {
        names.into_iter().collect()
    }
}

impl From<&[&str]> for Qualifiers {
    fn from(names: &[&str]) -> Self {
        names.iter().copied().collect()
    }
}

impl From<Vec<&str>> for Qualifiers {
    fn from(names: Vec<&str>) -> Self {
        names.into_iter().collect()
    }
}

impl From<Vec<String>> for Qualifiers {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}
