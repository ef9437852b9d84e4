use super::{
    Channel,
    error::{AtaError, AtaResult},
    poll::Delay,
    regs::{REG_DATA, REG_ERROR, RegisterAccess, SR_ERR},
};

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    /// PIO-reads `len` bytes into `buf`, one 32-bit data word at a time.
    ///
    /// A pending error is reported before waiting for data, and without any
    /// data register cycles. Returns the number of bytes moved.
    pub fn read_block(&mut self, buf: &mut [u8], len: usize) -> AtaResult<usize> {
        let got = buf.len();
        let block = buf
            .get_mut(..len)
            .ok_or(AtaError::BufferTooSmall { needed: len, got })?;

        self.check_error()?;
        self.wait_drq()?;

        let mut moved = 0;
        for word in block.chunks_exact_mut(4) {
            word.copy_from_slice(&self.regs.read_u32(REG_DATA).to_be_bytes());
            moved += 4;
        }

        self.check_error()?;
        Ok(moved)
    }

    /// PIO-writes the first `len` bytes of `buf`.
    pub fn write_block(&mut self, buf: &[u8], len: usize) -> AtaResult<usize> {
        let block = buf.get(..len).ok_or(AtaError::BufferTooSmall {
            needed: len,
            got: buf.len(),
        })?;

        self.wait_drq()?;

        let mut moved = 0;
        for word in block.chunks_exact(4) {
            let word = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
            self.regs.write_u32(REG_DATA, word);
            moved += 4;
        }

        self.check_error()?;
        Ok(moved)
    }

    fn check_error(&mut self) -> AtaResult<()> {
        if self.status() & SR_ERR != 0 {
            return Err(AtaError::Io(self.regs.read_u8(REG_ERROR)));
        }
        Ok(())
    }
}
