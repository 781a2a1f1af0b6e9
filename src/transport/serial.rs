//! # Serial TTY Transport
//!
//! Raw-mode access to the printer's serial device (USB-serial adapter or
//! RS-232 port), exposed as a plain `Read + Write` stream with a read
//! timeout so [`IoChannel`](super::IoChannel) can detect a silent device.
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary frames pass unmodified:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//! - **Read timeout**: `VMIN = 0`, `VTIME` in tenths of a second, so a
//!   `read` returns 0 bytes when the printer stays silent
//!
//! Port discovery and wiring are left to the caller; this module only
//! opens a path it is given.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::Fp705Error;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Default line speed of FP705 printers
pub const DEFAULT_BAUD: u32 = 115_200;

/// # Serial Printer Link
///
/// ## Example
///
/// ```no_run
/// use std::time::Duration;
/// use fp705::transport::SerialPort;
///
/// let port = SerialPort::open("/dev/ttyUSB0", 115_200, Duration::from_millis(500))?;
/// # Ok::<(), fp705::Fp705Error>(())
/// ```
pub struct SerialPort {
    file: File,
}

impl SerialPort {
    /// Open `device` in raw mode at `baud` with the given read timeout.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need root or dialout group)
    /// - The baud rate is not a standard one
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(
        device: P,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<Self, Fp705Error> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                Fp705Error::Transport(format!("Failed to open {}: {}", path.display(), e))
            })?;

        configure_tty_raw(file.as_raw_fd(), baud, read_timeout)?;
        debug!(device = %path.display(), baud, ?read_timeout, "serial port open");

        Ok(Self { file })
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// `VTIME` is in tenths of a second and fits one byte.
fn vtime_for(timeout: Duration) -> u8 {
    let tenths = timeout.as_millis().div_ceil(100);
    tenths.clamp(1, u8::MAX as u128) as u8
}

#[cfg(unix)]
fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        _ => return None,
    };
    Some(speed)
}

/// Configure a file descriptor for raw TTY mode with a read timeout.
///
/// ## What Gets Disabled
///
/// - **Input flags**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR, ICRNL, IXON, IXOFF, IXANY
/// - **Output flags**: OPOST
/// - **Local flags**: ECHO, ECHONL, ICANON, ISIG, IEXTEN
/// - **Control flags**: CSIZE, PARENB (then CS8 is set)
///
/// Note: IXON/IXOFF must be off. The status block and cp1251 text can
/// contain 0x11 (XON) and 0x13 (XOFF).
#[cfg(unix)]
fn configure_tty_raw(fd: i32, baud: u32, read_timeout: Duration) -> Result<(), Fp705Error> {
    use std::mem::MaybeUninit;

    let speed = baud_constant(baud)
        .ok_or_else(|| Fp705Error::Config(format!("Unsupported baud rate {}", baud)))?;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(Fp705Error::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8 | libc::CREAD | libc::CLOCAL;

    // Return after VTIME tenths even if nothing arrived
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = vtime_for(read_timeout);

    let speed_result = unsafe {
        libc::cfsetispeed(&mut termios, speed) | libc::cfsetospeed(&mut termios, speed)
    };
    if speed_result != 0 {
        return Err(Fp705Error::Transport(format!(
            "cfsetspeed failed: {}",
            io::Error::last_os_error()
        )));
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(Fp705Error::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32, _baud: u32, _read_timeout: Duration) -> Result<(), Fp705Error> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
