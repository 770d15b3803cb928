//! Audio unit: register file, frame sequencing, mixing and sample output.
//!
//! The bus clocks [`Apu::step`] once per APU cycle (every sixth master
//! tick). Channel outputs pass through the console's non-linear mixer and
//! are decimated to the host sample rate into the shared ring buffer,
//! which the host audio callback drains from its own thread.

use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::dmc::Dmc;
use crate::frame_counter::FrameCounter;
use crate::noise::Noise;
use crate::pulse::Pulse;
use crate::sweep::PulseChannel;
use crate::triangle::Triangle;

/// Host output sample rate.
pub const SAMPLE_RATE: u32 = 44_100;

/// APU cycles per host sample (~894.9 kHz / 44.1 kHz).
const CYCLES_PER_SAMPLE: u32 = 20;

/// Ring-buffer capacity in samples (~90 ms at 44.1 kHz).
const BUFFER_LENGTH: usize = 4096;

/// Pulse-pair mixer lookup: `95.52 / (8128 / n + 100)`.
const PULSE_TABLE: [f32; 31] = {
    let mut table = [0.0_f32; 31];
    let mut n = 1;
    while n < 31 {
        table[n] = 95.52 / (8128.0 / (n as f32) + 100.0);
        n += 1;
    }
    table
};

/// Triangle/noise/DMC mixer lookup: `163.67 / (24329 / n + 100)`.
const TND_TABLE: [f32; 203] = {
    let mut table = [0.0_f32; 203];
    let mut n = 1;
    while n < 203 {
        table[n] = 163.67 / (24329.0 / (n as f32) + 100.0);
        n += 1;
    }
    table
};

/// The audio coprocessor.
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame_counter: FrameCounter,
    buffer: Arc<AudioBuffer>,
    sample_sum: f32,
    sample_count: u32,
}

impl Apu {
    /// Create a powered-on audio unit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pulse1: Pulse::new(PulseChannel::One),
            pulse2: Pulse::new(PulseChannel::Two),
            triangle: Triangle::new(),
            noise: Noise::new(),
            dmc: Dmc::new(),
            frame_counter: FrameCounter::new(),
            buffer: Arc::new(AudioBuffer::new(BUFFER_LENGTH)),
            sample_sum: 0.0,
            sample_count: 0,
        }
    }

    /// Shared handle to the output ring buffer for the host audio
    /// callback.
    #[must_use]
    pub fn buffer(&self) -> Arc<AudioBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Reset to power-on state. The ring buffer is emptied but keeps its
    /// identity so host callbacks stay valid.
    pub fn reset(&mut self) {
        self.pulse1 = Pulse::new(PulseChannel::One);
        self.pulse2 = Pulse::new(PulseChannel::Two);
        self.triangle = Triangle::new();
        self.noise = Noise::new();
        self.dmc = Dmc::new();
        self.frame_counter = FrameCounter::new();
        self.buffer.reset();
        self.sample_sum = 0.0;
        self.sample_count = 0;
    }

    /// Write an audio register ($4000-$4013, $4015, $4017).
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(data),
            0x4001 => self.pulse1.write_sweep(data),
            0x4002 => self.pulse1.write_timer_lo(data),
            0x4003 => self.pulse1.write_timer_hi(data),

            0x4004 => self.pulse2.write_control(data),
            0x4005 => self.pulse2.write_sweep(data),
            0x4006 => self.pulse2.write_timer_lo(data),
            0x4007 => self.pulse2.write_timer_hi(data),

            0x4008 => self.triangle.write_linear(data),
            0x400A => self.triangle.write_timer_lo(data),
            0x400B => self.triangle.write_timer_hi(data),

            0x400C => self.noise.write_control(data),
            0x400E => self.noise.write_period(data),
            0x400F => self.noise.write_length(data),

            0x4010 => self.dmc.write_control(data),
            0x4011 => self.dmc.write_direct(data),
            0x4012 => self.dmc.write_sample_addr(data),
            0x4013 => self.dmc.write_sample_length(data),

            0x4015 => {
                self.pulse1.set_enabled(data & 0x01 != 0);
                self.pulse2.set_enabled(data & 0x02 != 0);
                self.triangle.set_enabled(data & 0x04 != 0);
                self.noise.set_enabled(data & 0x08 != 0);
                self.dmc.set_enabled(data & 0x10 != 0);
            }

            0x4017 => {
                let clock = self.frame_counter.write(data);
                if clock.quarter {
                    self.clock_quarter();
                }
                if clock.half {
                    self.clock_half();
                }
            }

            _ => log::debug!("unmapped audio register write ${addr:04X}"),
        }
    }

    /// Read the status register ($4015). Clears the frame interrupt.
    pub fn read_status(&mut self) -> u8 {
        let mut status = 0_u8;
        if self.pulse1.active() {
            status |= 0x01;
        }
        if self.pulse2.active() {
            status |= 0x02;
        }
        if self.triangle.active() {
            status |= 0x04;
        }
        if self.noise.active() {
            status |= 0x08;
        }
        if self.dmc.active() {
            status |= 0x10;
        }
        if self.frame_counter.irq_pending() {
            status |= 0x40;
        }
        if self.dmc.irq_pending() {
            status |= 0x80;
        }

        self.frame_counter.clear_irq();
        status
    }

    /// Run one APU cycle: channel timers, the frame sequencer, and sample
    /// decimation into the ring buffer.
    pub fn step(&mut self) {
        self.pulse1.clock_timer();
        self.pulse2.clock_timer();
        self.noise.clock_timer();
        self.dmc.clock_timer();
        // The triangle timer runs at CPU rate, twice per APU cycle.
        self.triangle.clock_timer();
        self.triangle.clock_timer();

        let clock = self.frame_counter.clock();
        if clock.quarter {
            self.clock_quarter();
        }
        if clock.half {
            self.clock_half();
        }

        self.sample_sum += self.output();
        self.sample_count += 1;
        if self.sample_count >= CYCLES_PER_SAMPLE {
            let sample = self.sample_sum / self.sample_count as f32;
            self.buffer.write(&[sample]);
            self.sample_sum = 0.0;
            self.sample_count = 0;
        }
    }

    /// Whether the frame or DMC interrupt is asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// Whether the DMC wants the bus to fetch a sample byte.
    #[must_use]
    pub fn dmc_needs_sample(&self) -> bool {
        self.dmc.needs_sample()
    }

    /// Processor-space address of the pending DMC fetch.
    #[must_use]
    pub fn dmc_sample_address(&self) -> u16 {
        self.dmc.sample_address()
    }

    /// Feed the fetched DMC sample byte.
    pub fn dmc_fill_sample(&mut self, data: u8) {
        self.dmc.fill_sample(data);
    }

    /// The mixed output level (0.0 to ~1.0) through the non-linear mix.
    #[must_use]
    pub fn output(&self) -> f32 {
        let pulses = usize::from(self.pulse1.output()) + usize::from(self.pulse2.output());
        let tnd = 3 * usize::from(self.triangle.output())
            + 2 * usize::from(self.noise.output())
            + usize::from(self.dmc.output());
        PULSE_TABLE[pulses] + TND_TABLE[tnd.min(202)]
    }

    fn clock_quarter(&mut self) {
        self.pulse1.clock_quarter();
        self.pulse2.clock_quarter();
        self.triangle.clock_quarter();
        self.noise.clock_quarter();
    }

    fn clock_half(&mut self) {
        self.pulse1.clock_half();
        self.pulse2.clock_half();
        self.triangle.clock_half();
        self.noise.clock_half();
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}
