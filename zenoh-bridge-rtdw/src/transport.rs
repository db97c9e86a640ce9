//! Modbus transport: register reads and writes against the RTD-W slave.

use crate::config::SerialConfig;
use crate::point::FunctionCode;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::error::Elapsed;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tracing::{debug, info, trace};

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Timeout, framing/CRC error, Modbus exception or unavailable port.
    #[error("Modbus communication failed: {0}")]
    Communication(String),

    /// The value cannot be encoded into a 16-bit register word.
    #[error("Value {value} does not fit a 16-bit register (signed: {signed})")]
    ValueOutOfRange { value: i64, signed: bool },
}

/// A register value with its implied decimal places.
///
/// `raw` is the integer read from the bus; the represented number is
/// `raw / 10^decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaledValue {
    raw: i64,
    decimals: u8,
}

impl ScaledValue {
    pub fn new(raw: i64, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Plain integer value.
    pub fn integer(value: i64) -> Self {
        Self::new(value, 0)
    }

    pub fn raw(&self) -> i64 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Integer part, truncated toward zero.
    pub fn trunc(&self) -> i64 {
        self.raw / divisor(self.decimals)
    }

    /// Multiply the represented value by an integer factor.
    pub fn times(&self, factor: i64) -> Self {
        Self::new(self.raw.saturating_mul(factor), self.decimals)
    }
}

/// Renders the shortest exact decimal form, keeping one fractional digit for
/// scaled registers: `2150`/2 is `21.5`, `2000`/2 is `20.0`, `45`/0 is `45`.
impl fmt::Display for ScaledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divisor = divisor(self.decimals);
        let sign = if self.raw < 0 { "-" } else { "" };
        let magnitude = self.raw.unsigned_abs();
        let whole = magnitude / divisor as u64;
        let fraction = magnitude % divisor as u64;

        if self.decimals == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        if fraction == 0 {
            return write!(f, "{}{}.0", sign, whole);
        }

        let digits = format!("{:0width$}", fraction, width = usize::from(self.decimals));
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

fn divisor(decimals: u8) -> i64 {
    10i64.pow(u32::from(decimals))
}

/// Interpret a register word.
pub fn word_to_raw(word: u16, signed: bool) -> i64 {
    if signed {
        i64::from(word as i16)
    } else {
        i64::from(word)
    }
}

/// Combine two registers (high word first) into one 32-bit value.
pub fn long_to_raw(high: u16, low: u16, signed: bool) -> i64 {
    let value = (u32::from(high) << 16) | u32::from(low);
    if signed {
        i64::from(value as i32)
    } else {
        i64::from(value)
    }
}

/// Scale a value by its implied decimals and encode it as a register word.
pub fn raw_to_word(value: i64, decimals: u8, signed: bool) -> Result<u16, TransportError> {
    let out_of_range = || TransportError::ValueOutOfRange { value, signed };
    let scaled = value
        .checked_mul(divisor(decimals))
        .ok_or_else(out_of_range)?;

    if signed {
        i16::try_from(scaled)
            .map(|v| v as u16)
            .map_err(|_| out_of_range())
    } else {
        u16::try_from(scaled).map_err(|_| out_of_range())
    }
}

/// Register-level access to the slave.
///
/// Implementations perform exactly one bus transaction per call and never
/// retry; the caller decides what happens after a failure.
#[async_trait]
pub trait Transport: Send {
    /// Read one register from holding (3) or input (4) space.
    async fn read_scaled_register(
        &mut self,
        address: u16,
        decimals: u8,
        function: FunctionCode,
        signed: bool,
    ) -> Result<ScaledValue, TransportError>;

    /// Read a 32-bit value spanning two registers.
    async fn read_long_counter(
        &mut self,
        address: u16,
        function: FunctionCode,
        signed: bool,
    ) -> Result<i64, TransportError>;

    /// Write one holding register with function code 6.
    async fn write_register(
        &mut self,
        address: u16,
        value: i64,
        decimals: u8,
        signed: bool,
    ) -> Result<(), TransportError>;
}

type Response<T> = Result<Result<Result<T, ExceptionCode>, tokio_modbus::Error>, Elapsed>;

/// Modbus RTU transport over a serial port (8N1).
///
/// The port is opened on first use and closed again after a bus or timeout
/// error, so the next transaction starts from a fresh connection.
pub struct ModbusTransport {
    config: SerialConfig,
    ctx: Option<Context>,
}

impl ModbusTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self { config, ctx: None }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    fn open(&self) -> Result<Context, TransportError> {
        let builder = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .timeout(self.timeout());

        let serial = tokio_serial::SerialStream::open(&builder).map_err(|e| {
            TransportError::Communication(format!(
                "Serial open failed on {}: {}",
                self.config.port, e
            ))
        })?;

        info!(
            "Opened {} at {} baud (slave {})",
            self.config.port, self.config.baud_rate, self.config.slave
        );

        Ok(rtu::attach_slave(serial, Slave(self.config.slave)))
    }

    fn context(&mut self) -> Result<&mut Context, TransportError> {
        if self.ctx.is_none() {
            self.ctx = Some(self.open()?);
        }

        self.ctx
            .as_mut()
            .ok_or_else(|| TransportError::Communication("Serial port not open".to_string()))
    }

    /// Flatten a Modbus response, dropping the connection on bus errors.
    fn settle<T>(&mut self, response: Response<T>) -> Result<T, TransportError> {
        match response {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(exception))) => Err(TransportError::Communication(format!(
                "Exception: {:?}",
                exception
            ))),
            Ok(Err(e)) => {
                self.ctx = None;
                Err(TransportError::Communication(e.to_string()))
            }
            Err(_) => {
                self.ctx = None;
                Err(TransportError::Communication(format!(
                    "Timeout after {} ms",
                    self.config.timeout_ms
                )))
            }
        }
    }

    async fn read_words(
        &mut self,
        address: u16,
        count: u16,
        function: FunctionCode,
    ) -> Result<Vec<u16>, TransportError> {
        let timeout = self.timeout();
        let ctx = self.context()?;

        let response = match function {
            FunctionCode::ReadHolding => {
                tokio::time::timeout(timeout, ctx.read_holding_registers(address, count)).await
            }
            FunctionCode::ReadInput => {
                tokio::time::timeout(timeout, ctx.read_input_registers(address, count)).await
            }
        };

        let words = self.settle(response)?;
        if words.len() < usize::from(count) {
            return Err(TransportError::Communication(format!(
                "Short response at {}: expected {} registers, got {}",
                address,
                count,
                words.len()
            )));
        }

        trace!(address, function = %function, ?words, "Read registers");
        Ok(words)
    }
}

#[async_trait]
impl Transport for ModbusTransport {
    async fn read_scaled_register(
        &mut self,
        address: u16,
        decimals: u8,
        function: FunctionCode,
        signed: bool,
    ) -> Result<ScaledValue, TransportError> {
        let words = self.read_words(address, 1, function).await?;
        Ok(ScaledValue::new(word_to_raw(words[0], signed), decimals))
    }

    async fn read_long_counter(
        &mut self,
        address: u16,
        function: FunctionCode,
        signed: bool,
    ) -> Result<i64, TransportError> {
        let words = self.read_words(address, 2, function).await?;
        Ok(long_to_raw(words[0], words[1], signed))
    }

    async fn write_register(
        &mut self,
        address: u16,
        value: i64,
        decimals: u8,
        signed: bool,
    ) -> Result<(), TransportError> {
        let word = raw_to_word(value, decimals, signed)?;
        let timeout = self.timeout();
        let ctx = self.context()?;

        let response = tokio::time::timeout(timeout, ctx.write_single_register(address, word)).await;
        self.settle(response)?;

        debug!(
            address,
            value,
            word,
            function = FunctionCode::WRITE_SINGLE_REGISTER,
            "Wrote register"
        );
        Ok(())
    }
}
