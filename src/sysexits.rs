//! legacy exit status codes for system programs, plus the status used when a
//! run completes with recorded item errors.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

/// value: 1 <br>
/// The run finished but one or more items could not be transferred.
pub const EX_ITEM_ERRORS: i32 = 1;

/// value: 2 <br>
/// Misuse of shell builtins (according to Bash documentation)
pub const EX_KEYWORD: i32 = 2;

/// value: 65 <br>
/// The input data was incorrect in some way. This should only be used for user’s data and not system files.
pub const EX_DATAERR: i32 = 65;

/// value: 66 <br>
/// An input file (not a system file) did not exist or was not readable.
pub const EX_NOINPUT: i32 = 66;

/// value: 69 <br>
/// A service is unavailable. Used when no backup destination can be found.
pub const EX_UNAVAILABLE: i32 = 69;

/// value: 70 <br>
/// An internal software error has been detected. This should be limited to non-operating system related errors as possible.
pub const EX_SOFTWARE: i32 = 70;

/// value: 71 <br>
/// An operating system error has been detected, e.g. the home directory cannot be determined.
pub const EX_OSERR: i32 = 71;

/// value: 74 <br>
/// An error occurred while doing I/O on some file.
pub const EX_IOERR: i32 = 74;

/// value: 75 <br>
/// Temporary failure, indicating something that is not really an error. Used when the operator declines a prompt.
pub const EX_TEMPFAIL: i32 = 75;

/// value: 78 <br>
/// Something was found in an unconfigured or misconfigured state.
pub const EX_CONFIG: i32 = 78;
