mod array;
mod atomic;
mod function;
mod map;
mod sequence;

pub use array::XdmArray;
pub(crate) use array::flatten_items;
pub use atomic::{AtomicValue, parse_xs_double};
pub use function::{NativeFn, XdmFunction};
pub use map::XdmMap;
pub use sequence::{XdmItem, XdmValue};
