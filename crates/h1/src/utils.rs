//! Small helpers shared by the codec and connection modules.

/// Returns early with `$error` unless `$predicate` holds.
///
/// Works like `assert!` but for recoverable failures, which is what most framing
/// checks are: the peer sent something wrong, not our code.
///
/// ```ignore
/// ensure!(block_len <= max_header_bytes, ProtocolError::header_too_large(block_len, max_header_bytes));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
