//! Lighting sink frames.
//!
//! The microcontroller driving the lights reads fixed five byte frames: one
//! command byte followed by an `f32` argument in little-endian order.

use std::io;

/// Size of one encoded frame on the wire.
pub const FRAME_LEN: usize = 5;

/// A command understood by the lighting hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightCommand {
    /// Display this energy level immediately.
    Energy(f32),
    /// One frame of the cooldown (and startup) animation.
    Cooldown(f32),
    /// Trigger the autonomous powerup flash.
    Powerup,
}

impl LightCommand {
    pub fn opcode(&self) -> u8 {
        match self {
            LightCommand::Energy(_) => b'e',
            LightCommand::Cooldown(_) => b'c',
            LightCommand::Powerup => b'p',
        }
    }

    pub fn argument(&self) -> f32 {
        match *self {
            LightCommand::Energy(v) | LightCommand::Cooldown(v) => v,
            LightCommand::Powerup => 0.0,
        }
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = self.opcode();
        frame[1..].copy_from_slice(&self.argument().to_le_bytes());
        frame
    }
}

/// Anything that can display animation commands.
pub trait LightingSink {
    fn send(&mut self, command: LightCommand) -> io::Result<()>;
}

/// Sink used when no lighting hardware is attached; every send succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LightingSink for NullSink {
    fn send(&mut self, _command: LightCommand) -> io::Result<()> {
        Ok(())
    }
}

/// Writes encoded frames to any byte stream, e.g. an open serial port.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: io::Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> LightingSink for FrameWriter<W> {
    fn send(&mut self, command: LightCommand) -> io::Result<()> {
        self.inner.write_all(&command.encode())?;
        self.inner.flush()
    }
}

impl<S: LightingSink + ?Sized> LightingSink for Box<S> {
    fn send(&mut self, command: LightCommand) -> io::Result<()> {
        (**self).send(command)
    }
}

impl<S: LightingSink> LightingSink for Option<S> {
    fn send(&mut self, command: LightCommand) -> io::Result<()> {
        match self {
            Some(sink) => sink.send(command),
            None => Ok(()),
        }
    }
}
