//! Trait bounds for user data attached to cell attributes.

use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Debug, hash::Hash};

/// Trait alias for data types that can be stored in cell attributes.
///
/// Attribute data must implement `Copy` so that degrouping a cell (splitting
/// one attribute record into two) can duplicate the payload without an
/// ownership protocol.
///
/// # Usage
///
/// ```rust
/// use cmap::core::traits::DataType;
///
/// fn takes_attribute_data<T: DataType>(data: T) -> T {
///     data
/// }
///
/// assert_eq!(takes_attribute_data(7_u32), 7);
/// assert_eq!(takes_attribute_data(Some(())), Some(()));
/// ```
///
/// Examples of types that implement `DataType`: primitive `Copy` types
/// (`i32`, `u64`, `char`), `Option<T>` for `T: DataType`, `()` for no data,
/// and custom `Copy` enums with serde support.
pub trait DataType:
    Copy + Eq + Hash + Ord + PartialEq + PartialOrd + Debug + Serialize + DeserializeOwned
{
}

// Blanket implementation for all types that satisfy the bounds
impl<T> DataType for T where
    T: Copy + Eq + Hash + Ord + PartialEq + PartialOrd + Debug + Serialize + DeserializeOwned
{
}
