//! Helper macro for generating domain port error enums.
//!
//! Every port error variant carries a single `message` field; the macro
//! derives `thiserror::Error` and emits a snake_case constructor per variant
//! plus a shared `message()` accessor.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { message: String },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant {
                            message: message.into(),
                        }
                    }
                }
            )*

            /// Detail message carried by the variant.
            pub fn message(&self) -> &str {
                match self {
                    $( Self::$variant { message } => message.as_str(), )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum StorePortError {
            Connection => "store connection failed: {message}",
            Write => "store write failed: {message}",
        }
    }

    #[test]
    fn constructors_accept_str() {
        let err = StorePortError::connection("refused");
        assert_eq!(err.to_string(), "store connection failed: refused");
        assert_eq!(err.message(), "refused");
    }

    #[test]
    fn multi_word_variants_get_snake_case_constructors() {
        let err = StorePortError::write(String::from("duplicate key"));
        assert!(matches!(err, StorePortError::Write { .. }));
    }
}
