/// Non-strict total order over `T`.
///
/// `precedes_or_equal(a, b)` must be a pure function of its arguments: the tree
/// uses the same predicate for placement and for validation.
pub trait Comparator<T> {
    fn precedes_or_equal(&self, a: &T, b: &T) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Ascending;

impl<T: PartialOrd> Comparator<T> for Ascending {
    fn precedes_or_equal(&self, a: &T, b: &T) -> bool {
        a <= b
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Descending;

impl<T: PartialOrd> Comparator<T> for Descending {
    fn precedes_or_equal(&self, a: &T, b: &T) -> bool {
        a >= b
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn precedes_or_equal(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// Averaging policy for the two middle elements of an even-sized stream.
///
/// Integers truncate toward zero, as `(lo + hi) / 2` would, but never overflow: when
/// the sum does not fit, the halves are added instead. Floats follow IEEE rules, so
/// two values near `MAX` average to infinity. Custom implementations own their
/// overflow behaviour.
pub trait Midpoint: Clone {
    fn midpoint_of(lo: &Self, hi: &Self) -> Self;
}

macro_rules! impl_midpoint_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Midpoint for $ty {
                #[inline]
                fn midpoint_of(lo: &Self, hi: &Self) -> Self {
                    // Overflow implies both operands share a sign.
                    lo.checked_add(*hi)
                        .map_or_else(|| lo / 2 + hi / 2 + (lo % 2 + hi % 2) / 2, |sum| sum / 2)
                }
            }
        )*
    };
}

macro_rules! impl_midpoint_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Midpoint for $ty {
                #[inline]
                fn midpoint_of(lo: &Self, hi: &Self) -> Self {
                    (*lo + *hi) / 2.0
                }
            }
        )*
    };
}

impl_midpoint_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_midpoint_float!(f32, f64);
