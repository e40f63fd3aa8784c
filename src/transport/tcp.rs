use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Mutex;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::apdu::{ApduAnswer, ApduCommand};
use crate::error::TransportError;
use crate::transport::Transport;

const MAX_RESPONSE_LEN: usize = 65536;

/// Connection to the APDU socket of the Speculos simulator.
///
/// Wire: `[u32 BE length][APDU]` send, `[u32 BE length][response]` recv.
/// The status word (`SW1 SW2`) follows the length-prefixed frame as a
/// bare 2-byte suffix; both are stitched back into one APDU response.
///
/// No read timeout is set, so a request waiting for a button press on the
/// simulated screen blocks until someone presses it.
pub struct TcpTransport {
    stream: Mutex<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: &str, port: u16) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .map_err(|e| TransportError::ConnectionFailed(format!("{addr}: {e}")))?;
        stream.set_nodelay(true)?;
        log::debug!("connected to Speculos at {addr}");
        Ok(Self {
            stream: Mutex::new(stream),
        })
    }
}

impl Transport for TcpTransport {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
        let apdu = command.serialize();
        let mut stream = self
            .stream
            .lock()
            .map_err(|e| TransportError::Comm(format!("mutex poisoned: {e}")))?;

        stream.write_u32::<BigEndian>(apdu.len() as u32)?;
        stream.write_all(&apdu)?;
        stream.flush()?;

        let resp_len = stream.read_u32::<BigEndian>()? as usize;
        if resp_len > MAX_RESPONSE_LEN {
            return Err(TransportError::Comm(format!(
                "response too large: {resp_len} bytes (max {MAX_RESPONSE_LEN})"
            )));
        }

        let mut resp = vec![0u8; resp_len + 2];
        stream.read_exact(&mut resp)?;

        Ok(ApduAnswer::from_raw(resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Spin up a local TCP listener, return (transport, server_stream).
    fn mock_pair() -> (TcpTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let transport = TcpTransport::new("127.0.0.1", port).unwrap();
        let (server, _) = listener.accept().unwrap();
        (transport, server)
    }

    /// Run one exchange on a background thread and hand back the request
    /// bytes the server saw.
    fn start_exchange(
        cmd: ApduCommand,
    ) -> (JoinHandle<Result<ApduAnswer, TransportError>>, TcpStream, Vec<u8>) {
        let (transport, mut server) = mock_pair();
        let handle = std::thread::spawn(move || transport.exchange(&cmd));

        let req_len = server.read_u32::<BigEndian>().unwrap() as usize;
        let mut req = vec![0u8; req_len];
        server.read_exact(&mut req).unwrap();
        (handle, server, req)
    }

    #[test]
    fn normal_exchange() {
        let cmd = ApduCommand::with_data(0x02, vec![0x01, 0x02]);
        let (handle, mut server, req) = start_exchange(cmd);
        assert_eq!(req, vec![0x00, 0x02, 0x00, 0x00, 0x02, 0x01, 0x02]);

        let payload = b"\xAA\xBB";
        server.write_u32::<BigEndian>(payload.len() as u32).unwrap();
        server.write_all(payload).unwrap();
        server.write_all(&[0x90, 0x00]).unwrap();
        server.flush().unwrap();

        let answer = handle.join().unwrap().unwrap();
        assert_eq!(answer.retcode(), 0x9000);
        assert_eq!(answer.data(), &[0xAA, 0xBB]);
    }

    #[test]
    fn zero_length_response() {
        let (handle, mut server, _) = start_exchange(ApduCommand::new(0x01));

        server.write_u32::<BigEndian>(0).unwrap();
        server.write_all(&[0x69, 0x85]).unwrap();
        server.flush().unwrap();

        let answer = handle.join().unwrap().unwrap();
        assert_eq!(answer.retcode(), 0x6985);
        assert!(answer.data().is_empty());
    }

    #[test]
    fn response_too_large_rejected() {
        let (handle, mut server, _) = start_exchange(ApduCommand::new(0x02));

        server.write_u32::<BigEndian>(65537).unwrap();
        server.flush().unwrap();

        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, TransportError::Comm(_)));
    }

    #[test]
    fn server_hangup_is_io_error() {
        let (handle, server, _) = start_exchange(ApduCommand::new(0x02));
        drop(server);

        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn connection_refused() {
        // Port 1 should be refused on most systems
        let result = TcpTransport::new("127.0.0.1", 1);
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }
}
