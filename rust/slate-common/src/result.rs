pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

/// Fails with an `InvalidState` error naming `$operation` when `$expr` is false.
///
/// `$message` is an optional human-readable reason; the stringified condition is
/// used when it is omitted.
#[macro_export]
macro_rules! verify_state {
    ($operation:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_state(result, $operation, stringify!($expr))?;
    }};
    ($operation:expr, $expr:expr, $message:expr) => {{
        let result = $expr;
        $crate::result::verify_state(result, $operation, $message)?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(name, condition)
    }
}

#[inline]
pub fn verify_state(predicate: bool, operation: &str, message: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_state(operation, message)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_format(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_state(operation: &str, message: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidState {
        operation: operation.to_string(),
        message: message.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::{ErrorClass, ErrorKind};

    use super::Result;

    fn check_len(buf: &[u8]) -> Result<usize> {
        verify_data!(buf, buf.len() >= 4);
        Ok(buf.len())
    }

    fn check_open(open: bool) -> Result<()> {
        verify_state!("end_object", open, "no object is open");
        Ok(())
    }

    fn check_index(index: usize, len: usize) -> Result<()> {
        verify_arg!(index, index < len);
        Ok(())
    }

    #[test]
    fn test_verify_data() {
        assert_eq!(check_len(&[0; 8]).unwrap(), 8);
        let err = check_len(&[0; 2]).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidFormat { element, message } => {
                assert_eq!(element, "buf");
                assert_eq!(message, "buf.len() >= 4");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_verify_state() {
        assert!(check_open(true).is_ok());
        let err = check_open(false).unwrap_err();
        assert_eq!(err.class(), ErrorClass::State);
        assert!(err.to_string().contains("no object is open"));
    }

    #[test]
    fn test_verify_arg() {
        assert!(check_index(1, 2).is_ok());
        assert_eq!(check_index(2, 2).unwrap_err().class(), ErrorClass::Argument);
    }
}
