// Источники пакетов для цикла захвата. Каждый вызов `acquire` ограничен
// дедлайном: UDP-сокет получает read timeout, поток перед чтением ждёт
// готовности через poll(2). Дескрипторы закрываются в Drop.

use std::{
    io::{ErrorKind, Read},
    net::{SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

use log::{debug, info, trace};
use sdo_types::PACKET_SIZE;

use crate::{CaptureError, CaptureResult};

/// Минимальный таймаут: `set_read_timeout(Some(0))` - ошибка.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Результат одной попытки получить пакет.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// Получен пакет длиной `n` байт (в начале буфера).
    Packet(usize),
    /// Данных нет, можно ждать дальше.
    Idle,
    /// Дедлайн или EOF посреди пакета; накопленные байты отброшены.
    Partial(usize),
    /// Конец входных данных.
    Eof,
}

/// Абстракция источника пакетов.
// Реализации: [`UdpSource`] (датаграммы) и [`StreamSource`] (поток байт).
pub trait PacketSource {
    /// Описание источника для логов.
    fn describe(&self) -> String;

    /// Получает не более одного пакета. Не блокируется дольше дедлайна
    /// больше чем на один интервал опроса.
    fn acquire(
        &mut self,
        buf: &mut [u8; PACKET_SIZE],
        deadline: Instant,
    ) -> CaptureResult<Acquired>;
}

/// Датаграммный источник: один `recv` на вызов, одна датаграмма - один пакет.
pub struct UdpSource {
    socket: UdpSocket,
    poll_interval: Duration,
    current_timeout: Option<Duration>,
}

/// Потоковый источник (pipe, stdin, файл): накапливает байты до полного пакета.
pub struct StreamSource<R: Read> {
    reader: R,
    poll_interval: Duration,
    #[cfg(unix)]
    poll_fd: Option<std::os::unix::io::RawFd>,
}

////////////////////////////////////////////////////////////////////////////////
// UdpSource
////////////////////////////////////////////////////////////////////////////////

impl UdpSource {
    /// Создаёт и привязывает сокет. Ошибка фатальна для вызывающего.
    pub fn bind(
        addr: SocketAddr,
        poll_interval: Duration,
    ) -> CaptureResult<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| CaptureError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        info!("Listening on udp://{}", socket.local_addr()?);

        Ok(Self::from_socket(socket, poll_interval))
    }

    pub fn from_socket(
        socket: UdpSocket,
        poll_interval: Duration,
    ) -> Self {
        Self {
            socket,
            poll_interval,
            current_timeout: None,
        }
    }

    pub fn local_addr(&self) -> CaptureResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    fn set_timeout(
        &mut self,
        timeout: Duration,
    ) -> CaptureResult<()> {
        if self.current_timeout != Some(timeout) {
            self.socket.set_read_timeout(Some(timeout))?;
            self.current_timeout = Some(timeout);
        }
        Ok(())
    }
}

impl PacketSource for UdpSource {
    fn describe(&self) -> String {
        match self.socket.local_addr() {
            Ok(a) => format!("udp://{a}"),
            Err(_) => "udp://?".to_string(),
        }
    }

    fn acquire(
        &mut self,
        buf: &mut [u8; PACKET_SIZE],
        deadline: Instant,
    ) -> CaptureResult<Acquired> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.set_timeout(remaining.min(self.poll_interval).max(MIN_WAIT))?;

        // Датаграмма длиннее PACKET_SIZE усекается ядром до размера буфера
        match self.socket.recv_from(buf) {
            Ok((0, from)) => {
                trace!("Empty datagram from {from}");
                Ok(Acquired::Idle)
            }
            Ok((n, from)) => {
                trace!("Datagram {n} B from {from}");
                Ok(Acquired::Packet(n))
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                trace!("No data: {e}");
                Ok(Acquired::Idle)
            }
            Err(e) => Err(e.into()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// StreamSource
////////////////////////////////////////////////////////////////////////////////

impl<R: Read> StreamSource<R> {
    /// Поток без ожидания готовности: каждое чтение может блокироваться.
    /// Подходит для файлов и буферов в памяти.
    pub fn new(
        reader: R,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reader,
            poll_interval,
            #[cfg(unix)]
            poll_fd: None,
        }
    }

    /// Ждёт готовности к чтению не дольше `timeout`.
    fn wait_readable(
        &self,
        timeout: Duration,
    ) -> CaptureResult<bool> {
        #[cfg(unix)]
        let ready = match self.poll_fd {
            Some(fd) => poll_readable(fd, timeout)?,
            None => true,
        };

        #[cfg(not(unix))]
        let ready = {
            let _ = timeout;
            true
        };

        Ok(ready)
    }
}

#[cfg(unix)]
impl<R: Read + std::os::unix::io::AsRawFd> StreamSource<R> {
    /// Поток с ожиданием через poll(2): дедлайн не зависит от того,
    /// пишет ли кто-нибудь в дескриптор.
    pub fn with_poll(
        reader: R,
        poll_interval: Duration,
    ) -> Self {
        let fd = reader.as_raw_fd();
        Self {
            reader,
            poll_interval,
            poll_fd: Some(fd),
        }
    }
}

#[cfg(unix)]
impl StreamSource<std::fs::File> {
    /// Стандартный ввод через дубликат дескриптора 0.
    ///
    /// `std::io::Stdin` буферизует данные сам, и poll(2) по дескриптору
    /// не видел бы уже прочитанное в его буфер.
    pub fn stdin(poll_interval: Duration) -> CaptureResult<Self> {
        use std::os::unix::io::FromRawFd;

        // SAFETY: dup возвращает новый дескриптор, которым владеет только File
        let fd = unsafe { libc::dup(libc::STDIN_FILENO) };
        if fd < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let file = unsafe { std::fs::File::from_raw_fd(fd) };

        Ok(Self::with_poll(file, poll_interval))
    }
}

#[cfg(not(unix))]
impl StreamSource<std::io::Stdin> {
    pub fn stdin(poll_interval: Duration) -> CaptureResult<Self> {
        Ok(Self::new(std::io::stdin(), poll_interval))
    }
}

impl<R: Read> PacketSource for StreamSource<R> {
    fn describe(&self) -> String {
        "stream".to_string()
    }

    fn acquire(
        &mut self,
        buf: &mut [u8; PACKET_SIZE],
        deadline: Instant,
    ) -> CaptureResult<Acquired> {
        let mut filled = 0;

        while filled < PACKET_SIZE {
            let now = Instant::now();
            if now >= deadline {
                if filled > 0 {
                    debug!("Deadline reached mid-packet, discarding {filled} B");
                    return Ok(Acquired::Partial(filled));
                }
                return Ok(Acquired::Idle);
            }

            let wait = (deadline - now).min(self.poll_interval).max(MIN_WAIT);
            if !self.wait_readable(wait)? {
                continue;
            }

            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled > 0 => {
                    debug!("End of stream mid-packet, discarding {filled} B");
                    return Ok(Acquired::Partial(filled));
                }
                Ok(0) => return Ok(Acquired::Eof),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Acquired::Packet(PACKET_SIZE))
    }
}

#[cfg(unix)]
fn poll_readable(
    fd: std::os::unix::io::RawFd,
    timeout: Duration,
) -> std::io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    // SAFETY: pfd живёт до конца вызова, nfds = 1
    let rc = unsafe { libc::poll(&mut pfd, 1, ms) };

    if rc < 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() == ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }

    // POLLHUP/POLLERR тоже считаем готовностью: read вернёт 0 или ошибку
    Ok(rc > 0)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
