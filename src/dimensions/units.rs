//! Defines the two coordinate systems relevant to a rendered formula: layout units and pixels
//!
//! The conversion between the two is not fixed: it is the *fixed scale* of a render handle,
//! i.e. the ratio of the requested text size to the reference text size the layout was computed for.

// ------------------------- BASIC UNITS --------------------------------

/// The unit in which the layout engine expresses all box geometry (width, height, depth, shift).
/// It is independent of the size at which the formula is finally drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Internal;

/// Final texture pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Px;

// ------------------- UNIT COMBINATORS -------------------------

/// If U is a unit and V is a unit, Ratio<U, V> is the unit U . V⁻¹
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio<U, V> {
	_numerator    : std::marker::PhantomData<U>,
	_denominator  : std::marker::PhantomData<V>,
}


impl<U, V> Ratio<U, V> {
	/// Creates new ratio unit
	pub const fn new() -> Self {
		Self {
			_numerator:   std::marker::PhantomData,
			_denominator: std::marker::PhantomData
		}
	}
}

/// Scale going from layout units to pixels
pub type FixedScale = Ratio<Px, Internal>;
