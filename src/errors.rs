//! Error types shared across the solvers.
//!
//! Contract violations (bad slot index, duplicate registration) are not
//! represented here: those are programmer errors handled by
//! `debug_assert!` at the call site, never by `Result`.

macro_rules! define_errors {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Clone, Debug, PartialEq, Eq)]
            pub struct $name(pub String);

            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    write!(f, "{}: {}", stringify!($name), self.0)
                }
            }

            impl std::error::Error for $name {}
        )*
    };
}

define_errors!(CalcError, BoundaryError, IndexError, ConfigError);

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_type_name() {
        let e = CalcError("singular tridiagonal matrix".into());
        assert_eq!(e.to_string(), "CalcError: singular tridiagonal matrix");
    }
}
