//! Simulated controller for host tests: a register file that logs every
//! access and answers commands from a per-opcode script.

use alloc::{collections::BTreeMap, collections::VecDeque, vec, vec::Vec};

use crate::drivers::ata::{
    Delay, RegisterAccess,
    regs::{
        CMD_PACKET, CTRL_SRST, REG_COMMAND, REG_CYL_HIGH, REG_CYL_LOW, REG_ERROR,
        REG_SECTOR_COUNT, REG_STATUS, SR_BSY, SR_DRQ, SR_ERR,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read8(usize),
    Write8(usize, u8),
    Read32,
    Write32(u32),
    ReadControl(usize),
    WriteControl(usize, u8),
}

enum Response {
    Data(Vec<u8>),
    Fail(u8),
    Sink,
}

pub(crate) struct NoDelay;

impl Delay for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

pub(crate) struct SimController {
    pub log: Vec<Access>,
    /// Whether the scratch (sector count) register keeps written values.
    pub scratch_sticks: bool,
    /// Cylinder low/high presented after a reset.
    pub signature: (u8, u8),
    pub idle_status: u8,
    pub stuck_busy: bool,
    pub error: Option<u8>,
    /// Raise the given error after this many data-register reads of the
    /// current command.
    pub fail_after_reads: Option<(usize, u8)>,
    /// Data returned once a full command packet has been written.
    pub packet_reply: Vec<u8>,
    responses: BTreeMap<u8, Response>,
    latched: [u8; 8],
    data_in: VecDeque<u32>,
    data_out: Vec<u32>,
    sink: bool,
    packet_words: usize,
    reads: usize,
    in_reset: bool,
}

impl SimController {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            scratch_sticks: true,
            signature: (0, 0),
            idle_status: 0x50,
            stuck_busy: false,
            error: None,
            fail_after_reads: None,
            packet_reply: Vec::new(),
            responses: BTreeMap::new(),
            latched: [0; 8],
            data_in: VecDeque::new(),
            data_out: Vec::new(),
            sink: false,
            packet_words: 0,
            reads: 0,
            in_reset: false,
        }
    }

    /// Answer `command` by offering `data` through the data register.
    pub fn respond(&mut self, command: u8, data: Vec<u8>) {
        self.responses.insert(command, Response::Data(data));
    }

    /// Answer `command` with the error bit and `code` in the error register.
    pub fn fail(&mut self, command: u8, code: u8) {
        self.responses.insert(command, Response::Fail(code));
    }

    /// Accept any amount of written data after `command`.
    pub fn accept_writes(&mut self, command: u8) {
        self.responses.insert(command, Response::Sink);
    }

    pub fn writes_to(&self, reg: usize) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Write8(r, v) if r == reg => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<u8> {
        self.writes_to(REG_COMMAND)
    }

    pub fn data_reads(&self) -> usize {
        self.log.iter().filter(|a| **a == Access::Read32).count()
    }

    pub fn data_out_bytes(&self) -> Vec<u8> {
        self.data_out.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn current_status(&self) -> u8 {
        if self.stuck_busy {
            return SR_BSY;
        }
        let mut status = self.idle_status;
        if !self.data_in.is_empty() || self.sink || self.packet_words > 0 {
            status |= SR_DRQ;
        }
        if self.error.is_some() {
            status |= SR_ERR;
        }
        status
    }

    fn load(&mut self, data: &[u8]) {
        self.data_in.extend(data.chunks(4).map(|c| {
            let mut word = [0u8; 4];
            word[..c.len()].copy_from_slice(c);
            u32::from_be_bytes(word)
        }));
    }

    fn issue(&mut self, command: u8) {
        self.error = None;
        self.sink = false;
        self.reads = 0;
        self.data_in.clear();

        if command == CMD_PACKET {
            self.packet_words = 3;
            return;
        }

        let data = match self.responses.get(&command) {
            Some(Response::Data(data)) => Some(data.clone()),
            Some(Response::Fail(code)) => {
                self.error = Some(*code);
                None
            }
            Some(Response::Sink) => {
                self.sink = true;
                None
            }
            None => None,
        };
        if let Some(data) = data {
            self.load(&data);
        }
    }
}

impl RegisterAccess for SimController {
    fn read_u8(&mut self, reg: usize) -> u8 {
        self.log.push(Access::Read8(reg));
        match reg {
            REG_STATUS => self.current_status(),
            REG_ERROR => self.error.unwrap_or(0),
            _ => self.latched[reg],
        }
    }

    fn write_u8(&mut self, reg: usize, value: u8) {
        self.log.push(Access::Write8(reg, value));
        match reg {
            REG_COMMAND => self.issue(value),
            REG_SECTOR_COUNT if !self.scratch_sticks => {}
            _ => self.latched[reg] = value,
        }
    }

    fn read_u32(&mut self, _reg: usize) -> u32 {
        self.log.push(Access::Read32);
        self.reads += 1;
        if let Some((after, code)) = self.fail_after_reads {
            if self.reads == after {
                self.error = Some(code);
            }
        }
        self.data_in.pop_front().unwrap_or(0)
    }

    fn write_u32(&mut self, _reg: usize, value: u32) {
        self.log.push(Access::Write32(value));
        self.data_out.push(value);
        if self.packet_words > 0 {
            self.packet_words -= 1;
            if self.packet_words == 0 {
                let reply = self.packet_reply.clone();
                self.load(&reply);
            }
        }
    }

    fn read_control(&mut self, reg: usize) -> u8 {
        self.log.push(Access::ReadControl(reg));
        self.current_status()
    }

    fn write_control(&mut self, reg: usize, value: u8) {
        self.log.push(Access::WriteControl(reg, value));
        if value & CTRL_SRST != 0 {
            self.in_reset = true;
        } else if self.in_reset {
            self.in_reset = false;
            self.latched[REG_CYL_LOW] = self.signature.0;
            self.latched[REG_CYL_HIGH] = self.signature.1;
        }
    }
}

/// Lays out a parameter block the way it lands in memory after a data-port
/// transfer: words byte-swapped, text in swapped pairs.
pub(crate) fn param_block(len: usize, words: &[(usize, u16)], text: &[(usize, usize, &str)]) -> Vec<u8> {
    let mut block = vec![0u8; len];
    for &(index, value) in words {
        block[index * 2..index * 2 + 2].copy_from_slice(&value.to_le_bytes());
    }
    for &(offset, width, s) in text {
        let field = &mut block[offset..offset + width];
        field.fill(b' ');
        field[..s.len()].copy_from_slice(s.as_bytes());
        for pair in field.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }
    block
}

pub(crate) fn native_block(lba: bool, lba48: bool, total28: u32, total48: u32) -> Vec<u8> {
    let words = [
        (1, 1024),
        (3, 16),
        (6, 63),
        (49, if lba { 1 << 9 } else { 0 }),
        (83, if lba48 { 1 << 10 } else { 0 }),
        (60, total28 as u16),
        (61, (total28 >> 16) as u16),
        (100, total48 as u16),
        (101, (total48 >> 16) as u16),
    ];
    param_block(
        512,
        &words,
        &[(20, 20, "SIM0001"), (46, 8, "1.0"), (54, 40, "SIMULATED DISK")],
    )
}

pub(crate) fn packet_block() -> Vec<u8> {
    param_block(
        256,
        &[(0, 0x8580)],
        &[(20, 20, "OPT0042"), (46, 8, "0272"), (54, 40, "SIMULATED DVD")],
    )
}
