// Fixed-arity typed rows built on top of the plain CSV reader.
use shared::utils::convert::FromField;

/// A tuple that can be built from one CSV row, element `i` from field `i`.
///
/// Missing trailing fields convert from the empty string and surplus fields are
/// ignored, so the row shape is never validated here.
pub trait FromRow: Sized {
    const ARITY: usize;

    fn from_row(fields: &[String]) -> Self;
}

/// Column placeholder: consumes a field and keeps nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Skip;

impl FromField for Skip {
    fn from_field(_text: &str) -> Self {
        Skip
    }
}

fn field_at(fields: &[String], index: usize) -> &str {
    fields.get(index).map(String::as_str).unwrap_or("")
}

macro_rules! impl_from_row {
    ($arity:expr; $($t:ident => $idx:tt),+) => {
        impl<$($t: FromField),+> FromRow for ($($t,)+) {
            const ARITY: usize = $arity;

            fn from_row(fields: &[String]) -> Self {
                ($($t::from_field(field_at(fields, $idx)),)+)
            }
        }
    };
}

impl_from_row!(1; A => 0);
impl_from_row!(2; A => 0, B => 1);
impl_from_row!(3; A => 0, B => 1, C => 2);
impl_from_row!(4; A => 0, B => 1, C => 2, D => 3);
impl_from_row!(5; A => 0, B => 1, C => 2, D => 3, E => 4);
impl_from_row!(6; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);
impl_from_row!(7; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6);
impl_from_row!(8; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6, H => 7);
impl_from_row!(9; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6, H => 7, I => 8);
impl_from_row!(10; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6, H => 7, I => 8, J => 9);
impl_from_row!(11; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6, H => 7, I => 8, J => 9,
    K => 10);
impl_from_row!(12; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6, H => 7, I => 8, J => 9,
    K => 10, L => 11);
