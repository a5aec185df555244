// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory data store backing a register server.
//!
//! Four independent sequences model the Modbus data objects. All
//! accesses are range-checked against the configured capacities;
//! out-of-range accesses raise [`Exception::IllegalDataAddress`] and
//! leave the store untouched. Addressing is 0-based.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::Path,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use byteorder::{BigEndian, ReadBytesExt as _, WriteBytesExt as _};

use crate::frame::{Address, Coil, Exception, Quantity, Response, SlaveRequest, Word};

use super::Service;

const COILS_FILE: &str = "coils.dat";
const DISCRETE_INPUTS_FILE: &str = "discrete-inputs.dat";
const HOLDING_REGISTERS_FILE: &str = "holding-registers.dat";
const INPUT_REGISTERS_FILE: &str = "input-registers.dat";

/// Capacity of each data object sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistersConfig {
    /// Number of coils.
    pub coils: usize,
    /// Number of discrete inputs.
    pub discrete_inputs: usize,
    /// Number of holding registers.
    pub holding_registers: usize,
    /// Number of input registers.
    pub input_registers: usize,
}

impl Default for RegistersConfig {
    fn default() -> Self {
        Self {
            coils: 65_535,
            discrete_inputs: 65_535,
            holding_registers: 65_535,
            input_registers: 65_535,
        }
    }
}

/// The four Modbus data object sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    coils: Vec<Coil>,
    discrete_inputs: Vec<Coil>,
    holding_registers: Vec<Word>,
    input_registers: Vec<Word>,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(RegistersConfig::default())
    }
}

impl Registers {
    /// Creates a zeroed store with the given capacities.
    #[must_use]
    pub fn new(config: RegistersConfig) -> Self {
        Self {
            coils: vec![false; config.coils],
            discrete_inputs: vec![false; config.discrete_inputs],
            holding_registers: vec![0; config.holding_registers],
            input_registers: vec![0; config.input_registers],
        }
    }

    fn check_range(len: usize, offset: Address, count: usize) -> Result<(), Exception> {
        let end = usize::from(offset)
            .checked_add(count)
            .ok_or(Exception::IllegalDataAddress)?;
        if end > len {
            return Err(Exception::IllegalDataAddress);
        }
        Ok(())
    }

    fn read_range<V: Copy>(
        values: &[V],
        offset: Address,
        count: Quantity,
    ) -> Result<Vec<V>, Exception> {
        Self::check_range(values.len(), offset, count.into())?;
        let start = usize::from(offset);
        Ok(values[start..start + usize::from(count)].to_vec())
    }

    fn write_range<V: Copy>(
        values: &mut [V],
        offset: Address,
        source: &[V],
    ) -> Result<(), Exception> {
        Self::check_range(values.len(), offset, source.len())?;
        let start = usize::from(offset);
        values[start..start + source.len()].copy_from_slice(source);
        Ok(())
    }

    /// Reads `count` coils starting at `offset`.
    pub fn read_coils(&self, offset: Address, count: Quantity) -> Result<Vec<Coil>, Exception> {
        Self::read_range(&self.coils, offset, count)
    }

    /// Reads `count` discrete inputs starting at `offset`.
    pub fn read_discrete_inputs(
        &self,
        offset: Address,
        count: Quantity,
    ) -> Result<Vec<Coil>, Exception> {
        Self::read_range(&self.discrete_inputs, offset, count)
    }

    /// Reads `count` holding registers starting at `offset`.
    pub fn read_holding_registers(
        &self,
        offset: Address,
        count: Quantity,
    ) -> Result<Vec<Word>, Exception> {
        Self::read_range(&self.holding_registers, offset, count)
    }

    /// Reads `count` input registers starting at `offset`.
    pub fn read_input_registers(
        &self,
        offset: Address,
        count: Quantity,
    ) -> Result<Vec<Word>, Exception> {
        Self::read_range(&self.input_registers, offset, count)
    }

    /// Sets or clears a single coil.
    pub fn write_single_coil(&mut self, offset: Address, value: Coil) -> Result<(), Exception> {
        let slot = self
            .coils
            .get_mut(usize::from(offset))
            .ok_or(Exception::IllegalDataAddress)?;
        *slot = value;
        Ok(())
    }

    /// Writes a single holding register.
    pub fn write_single_register(&mut self, offset: Address, value: Word) -> Result<(), Exception> {
        let slot = self
            .holding_registers
            .get_mut(usize::from(offset))
            .ok_or(Exception::IllegalDataAddress)?;
        *slot = value;
        Ok(())
    }

    /// Writes a run of coils starting at `offset`.
    pub fn write_multiple_coils(
        &mut self,
        offset: Address,
        values: &[Coil],
    ) -> Result<(), Exception> {
        Self::write_range(&mut self.coils, offset, values)
    }

    /// Writes a run of holding registers starting at `offset`.
    pub fn write_multiple_registers(
        &mut self,
        offset: Address,
        values: &[Word],
    ) -> Result<(), Exception> {
        Self::write_range(&mut self.holding_registers, offset, values)
    }

    /// Sets a discrete input from the process side. Discrete inputs
    /// are read-only on the wire.
    pub fn set_discrete_input(&mut self, offset: Address, value: Coil) -> Result<(), Exception> {
        let slot = self
            .discrete_inputs
            .get_mut(usize::from(offset))
            .ok_or(Exception::IllegalDataAddress)?;
        *slot = value;
        Ok(())
    }

    /// Sets an input register from the process side. Input registers
    /// are read-only on the wire.
    pub fn set_input_register(&mut self, offset: Address, value: Word) -> Result<(), Exception> {
        let slot = self
            .input_registers
            .get_mut(usize::from(offset))
            .ok_or(Exception::IllegalDataAddress)?;
        *slot = value;
        Ok(())
    }

    /// Loads all four sequences from `dir`.
    ///
    /// A missing file keeps the corresponding defaults. An on-disk
    /// array longer than the configured capacity grows the in-memory
    /// sequence; a shorter one overwrites the leading elements.
    pub fn load(&mut self, dir: &Path) -> io::Result<()> {
        if let Some(coils) = load_bits(&dir.join(COILS_FILE))? {
            apply_loaded(&mut self.coils, coils);
        }
        if let Some(inputs) = load_bits(&dir.join(DISCRETE_INPUTS_FILE))? {
            apply_loaded(&mut self.discrete_inputs, inputs);
        }
        if let Some(words) = load_words(&dir.join(HOLDING_REGISTERS_FILE))? {
            apply_loaded(&mut self.holding_registers, words);
        }
        if let Some(words) = load_words(&dir.join(INPUT_REGISTERS_FILE))? {
            apply_loaded(&mut self.input_registers, words);
        }
        Ok(())
    }

    /// Saves all four sequences into `dir`, creating it if necessary.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        save_bits(&dir.join(COILS_FILE), &self.coils)?;
        save_bits(&dir.join(DISCRETE_INPUTS_FILE), &self.discrete_inputs)?;
        save_words(&dir.join(HOLDING_REGISTERS_FILE), &self.holding_registers)?;
        save_words(&dir.join(INPUT_REGISTERS_FILE), &self.input_registers)?;
        Ok(())
    }
}

fn apply_loaded<V: Copy>(values: &mut Vec<V>, loaded: Vec<V>) {
    if loaded.len() > values.len() {
        *values = loaded;
    } else {
        values[..loaded.len()].copy_from_slice(&loaded);
    }
}

fn open_existing(path: &Path) -> io::Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::warn!("No persisted data at {}, keeping defaults", path.display());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn load_bits(path: &Path) -> io::Result<Option<Vec<Coil>>> {
    let Some(file) = open_existing(path)? else {
        return Ok(None);
    };
    let mut reader = BufReader::new(file);
    let len = reader.read_u32::<BigEndian>()? as usize;
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(reader.read_u8()? != 0);
    }
    Ok(Some(values))
}

fn load_words(path: &Path) -> io::Result<Option<Vec<Word>>> {
    let Some(file) = open_existing(path)? else {
        return Ok(None);
    };
    let mut reader = BufReader::new(file);
    let len = reader.read_u32::<BigEndian>()? as usize;
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(reader.read_u16::<BigEndian>()?);
    }
    Ok(Some(values))
}

fn save_bits(path: &Path, values: &[Coil]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_u32::<BigEndian>(values.len() as u32)?;
    for value in values {
        writer.write_u8((*value).into())?;
    }
    Ok(())
}

fn save_words(path: &Path, values: &[Word]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_u32::<BigEndian>(values.len() as u32)?;
    for value in values {
        writer.write_u16::<BigEndian>(*value)?;
    }
    Ok(())
}

/// A [`Service`] serving requests straight from a shared [`Registers`]
/// store.
///
/// One readers-writer lock protects the whole store: read functions
/// take the shared lock, write functions the exclusive one. Clones
/// share the same store, so the process can mutate it while servers
/// are running.
#[derive(Debug, Clone, Default)]
pub struct RegisterService {
    registers: Arc<RwLock<Registers>>,
}

impl RegisterService {
    /// Creates a service around a zeroed store with the given
    /// capacities.
    #[must_use]
    pub fn new(config: RegistersConfig) -> Self {
        Self::with_registers(Registers::new(config))
    }

    /// Creates a service around a prepared store.
    #[must_use]
    pub fn with_registers(registers: Registers) -> Self {
        Self {
            registers: Arc::new(RwLock::new(registers)),
        }
    }

    /// The shared store behind this service.
    #[must_use]
    pub fn registers(&self) -> Arc<RwLock<Registers>> {
        Arc::clone(&self.registers)
    }

    /// Loads the store from `dir`. See [`Registers::load`].
    pub fn load(&self, dir: &Path) -> io::Result<()> {
        let mut registers = self
            .registers
            .write()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "register store lock poisoned"))?;
        registers.load(dir)
    }

    /// Saves the store into `dir`. See [`Registers::save`].
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        let registers = self
            .registers
            .read()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "register store lock poisoned"))?;
        registers.save(dir)
    }
}

#[async_trait]
impl Service for RegisterService {
    async fn call(&self, request: SlaveRequest) -> Result<Response, Exception> {
        use crate::frame::Request::*;
        match request.request {
            ReadCoils(offset, count) => {
                let registers = self
                    .registers
                    .read()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers.read_coils(offset, count).map(Response::ReadCoils)
            }
            ReadDiscreteInputs(offset, count) => {
                let registers = self
                    .registers
                    .read()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers
                    .read_discrete_inputs(offset, count)
                    .map(Response::ReadDiscreteInputs)
            }
            ReadHoldingRegisters(offset, count) => {
                let registers = self
                    .registers
                    .read()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers
                    .read_holding_registers(offset, count)
                    .map(Response::ReadHoldingRegisters)
            }
            ReadInputRegisters(offset, count) => {
                let registers = self
                    .registers
                    .read()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers
                    .read_input_registers(offset, count)
                    .map(Response::ReadInputRegisters)
            }
            WriteSingleCoil(offset, value) => {
                let mut registers = self
                    .registers
                    .write()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers.write_single_coil(offset, value)?;
                Ok(Response::WriteSingleCoil(offset, value))
            }
            WriteSingleRegister(offset, value) => {
                let mut registers = self
                    .registers
                    .write()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers.write_single_register(offset, value)?;
                Ok(Response::WriteSingleRegister(offset, value))
            }
            WriteMultipleCoils(offset, values) => {
                let mut registers = self
                    .registers
                    .write()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers.write_multiple_coils(offset, &values)?;
                Ok(Response::WriteMultipleCoils(offset, values.len() as Quantity))
            }
            WriteMultipleRegisters(offset, values) => {
                let mut registers = self
                    .registers
                    .write()
                    .map_err(|_| Exception::ServerDeviceFailure)?;
                registers.write_multiple_registers(offset, &values)?;
                Ok(Response::WriteMultipleRegisters(
                    offset,
                    values.len() as Quantity,
                ))
            }
            Custom(code, _) => {
                log::debug!("Rejecting unsupported function code {code:#04X}");
                Err(Exception::IllegalFunction)
            }
        }
    }
}
