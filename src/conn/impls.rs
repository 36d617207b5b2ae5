use crate::conn::Connection;
use crate::conn::ConnectionExt;
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

impl Connection for TcpStream {
    type Error = std::io::Error;

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        use std::io::Write;

        Write::write_all(self, &[byte])
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        use std::io::Write;

        Write::write_all(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        use std::io::Write;

        Write::flush(self)
    }

    fn on_session_start(&mut self) -> Result<(), Self::Error> {
        // the protocol is lots of tiny packets; Nagle hurts badly here
        self.set_nodelay(true)
    }
}

impl ConnectionExt for TcpStream {
    fn read(&mut self) -> Result<u8, Self::Error> {
        use std::io::Read;

        self.set_nonblocking(false)?;

        let mut buf = [0u8];
        Read::read_exact(self, &mut buf)?;
        Ok(buf[0])
    }

    fn peek(&mut self) -> Result<Option<u8>, Self::Error> {
        self.set_nonblocking(true)?;

        let mut buf = [0u8];
        match Self::peek(self, &mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(unix)]
impl Connection for UnixStream {
    type Error = std::io::Error;

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        use std::io::Write;

        Write::write_all(self, &[byte])
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        use std::io::Write;

        Write::write_all(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        use std::io::Write;

        Write::flush(self)
    }
}

#[cfg(unix)]
impl ConnectionExt for UnixStream {
    fn read(&mut self) -> Result<u8, Self::Error> {
        use std::io::Read;

        self.set_nonblocking(false)?;

        let mut buf = [0u8];
        Read::read_exact(self, &mut buf)?;
        Ok(buf[0])
    }

    fn peek(&mut self) -> Result<Option<u8>, Self::Error> {
        use std::os::unix::io::AsRawFd;

        self.set_nonblocking(true)?;

        // std::os::unix::net::UnixStream::peek is not stable, so peek via a
        // raw `recv(2)` with `MSG_PEEK` instead; this preserves the exact
        // semantics of the TcpStream::peek path above.
        let mut buf = [0u8];
        let fd = self.as_raw_fd();
        let n = unsafe {
            libc_recv(
                fd,
                buf.as_mut_ptr() as *mut std::os::raw::c_void,
                buf.len(),
                MSG_PEEK,
            )
        };

        if n < 0 {
            let err = std::io::Error::last_os_error();
            return if err.kind() == std::io::ErrorKind::WouldBlock {
                Ok(None)
            } else {
                Err(err)
            };
        }

        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(buf[0]))
        }
    }
}

#[cfg(unix)]
const MSG_PEEK: std::os::raw::c_int = 2;

#[cfg(unix)]
extern "C" {
    #[link_name = "recv"]
    fn libc_recv(
        socket: std::os::raw::c_int,
        buf: *mut std::os::raw::c_void,
        len: usize,
        flags: std::os::raw::c_int,
    ) -> isize;
}
