// Ready-made actions for the common kinds of options.
use std::ops::AddAssign;

use shared::utils::convert::FromField;

/// Flips `flag` every time the option is seen.
pub fn toggle_param(flag: &mut bool) -> impl FnMut(&str) + '_ {
    move |_| *flag = !*flag
}

/// Counts occurrences, e.g. `-v -v` for more verbose output.
pub fn increment_param<T>(counter: &mut T) -> impl FnMut(&str) + '_
where
    T: AddAssign + From<u8>,
{
    move |_| *counter += T::from(1u8)
}

/// Stores the option value converted with [`FromField`].
pub fn value_param<T: FromField>(target: &mut T) -> impl FnMut(&str) + '_ {
    move |text| *target = T::from_field(text)
}
