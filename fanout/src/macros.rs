//! Macros for building [`crate::error::FanoutError`] values with less boilerplate.

/// Creates a [`crate::error::FanoutError`] from an error kind and a static description.
///
/// An optional third argument is rendered with [`ToString`] and stored as dynamic detail,
/// and a trailing `source: expr` attaches the originating error.
///
/// ```
/// use fanout::error::ErrorKind;
/// use fanout::fanout_error;
///
/// let err = fanout_error!(ErrorKind::FetchFailed, "Fetch failed", format!("item {}", 7));
/// assert_eq!(err.detail(), Some("item 7"));
/// ```
#[macro_export]
macro_rules! fanout_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::FanoutError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::FanoutError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::FanoutError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::FanoutError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Returns early with a [`crate::error::FanoutError`] built by [`fanout_error!`].
#[macro_export]
macro_rules! bail {
    ($($args:tt)+) => {
        return ::core::result::Result::Err($crate::fanout_error!($($args)+))
    };
}
