//! The system bus: subsystem ownership, address decode and the master
//! clock.
//!
//! All subsystems are passive; the bus is the clock. Each [`Bus::cycle`]
//! call is one master tick: the CPU steps on every third tick, the audio
//! unit on every sixth, and the video produces one dot per tick. The
//! return value is the video's frame-complete signal.
//!
//! Processor-space decode:
//!
//! | Range | Target |
//! |---|---|
//! | $0000-$1FFF | work RAM (mirrored every 2 KB) |
//! | $2000-$3FFF | video ports (address & 7) |
//! | $4000-$4013 | audio registers (write only) |
//! | $4014 | OAM-DMA trigger (write only) |
//! | $4015 | audio status |
//! | $4016-$4017 | input ports / strobe, audio frame counter |
//! | $6000-$7FFF | mapper program RAM |
//! | $8000-$FFFF | mapper program ROM (writes reach bank registers) |

use std::sync::Arc;

use kitsune_apu::{Apu, AudioBuffer};
use kitsune_cpu::{Bus as CpuBus, Cpu};
use kitsune_mappers::{Cartridge, CartridgeError, Mapper};
use kitsune_ppu::{Mirroring, Ppu, VideoBus};

use crate::host::HostService;
use crate::input::Input;

/// Errors surfaced while bringing the emulator up.
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    /// The cartridge image failed to parse or uses unsupported hardware.
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// Interrupt lines routed through the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Maskable interrupt request to the CPU.
    Maskable,
    /// Non-maskable interrupt request to the CPU.
    NonMaskable,
    /// Full system reset; always non-fatal.
    Reset,
    /// Mapper scanline edge (MMC3 counter).
    Mapper,
}

/// Translate the mapper's mirror mode into the video's.
fn mirroring(mapper: &Mapper) -> Mirroring {
    match mapper.mirroring() {
        kitsune_mappers::Mirroring::Horizontal => Mirroring::Horizontal,
        kitsune_mappers::Mirroring::Vertical => Mirroring::Vertical,
        kitsune_mappers::Mirroring::OneScreenLow => Mirroring::OneScreenLow,
        kitsune_mappers::Mirroring::OneScreenHigh => Mirroring::OneScreenHigh,
    }
}

/// Video-side bus adapter: character memory and the live mirror mode from
/// the mapper, pixels to the host, interrupt edges collected for the CPU.
struct VideoAdapter<'a, H: HostService> {
    mapper: &'a mut Mapper,
    host: &'a mut H,
    nmi: &'a mut bool,
    irq: &'a mut bool,
}

impl<H: HostService> VideoBus for VideoAdapter<'_, H> {
    fn chr_read(&mut self, addr: u16) -> u8 {
        self.mapper.read_chr(addr)
    }

    fn chr_write(&mut self, addr: u16, data: u8) {
        self.mapper.write_chr(addr, data);
    }

    fn mirroring(&self) -> Mirroring {
        mirroring(self.mapper)
    }

    fn set_pixel(&mut self, color: u8, red: bool, green: bool, blue: bool, x: u8, y: u8) {
        self.host.set_pixel(color, red, green, blue, x, y);
    }

    fn non_maskable_interrupt(&mut self) {
        *self.nmi = true;
    }

    fn mapper_interrupt(&mut self) {
        if self.mapper.scanline_interrupt() {
            *self.irq = true;
        }
    }
}

/// CPU-side bus adapter implementing the processor-space decode.
struct CpuAdapter<'a, H: HostService> {
    wram: &'a mut [u8; 0x800],
    ppu: &'a mut Ppu,
    apu: &'a mut Apu,
    input: &'a mut Input,
    mapper: &'a mut Mapper,
    host: &'a mut H,
    /// OAM-DMA page captured from a $4014 write, applied after the CPU
    /// step returns.
    dma_request: &'a mut Option<u8>,
    /// Interrupt edges raised by video ports touched mid-instruction.
    nmi: &'a mut bool,
    irq: &'a mut bool,
}

impl<H: HostService> CpuBus for CpuAdapter<'_, H> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.wram[usize::from(addr & 0x07FF)],
            0x2000..=0x3FFF => {
                let mut adapter = VideoAdapter {
                    mapper: &mut *self.mapper,
                    host: &mut *self.host,
                    nmi: &mut *self.nmi,
                    irq: &mut *self.irq,
                };
                self.ppu.read_port(&mut adapter, addr)
            }
            0x4015 => self.apu.read_status(),
            0x4016..=0x4017 => self.input.read(addr),
            0x6000..=0x7FFF => self.mapper.read_ram(addr),
            0x8000..=0xFFFF => self.mapper.read_rom(addr),
            // Write-only and unmapped ranges are open bus.
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.wram[usize::from(addr & 0x07FF)] = data,
            0x2000..=0x3FFF => {
                let mut adapter = VideoAdapter {
                    mapper: &mut *self.mapper,
                    host: &mut *self.host,
                    nmi: &mut *self.nmi,
                    irq: &mut *self.irq,
                };
                self.ppu.write_port(&mut adapter, addr, data);
            }
            0x4014 => *self.dma_request = Some(data),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, data),
            0x4016 => self.input.write(addr, data, &*self.host),
            0x6000..=0x7FFF => self.mapper.write_ram(addr, data),
            0x8000..=0xFFFF => self.mapper.write_rom(addr, data),
            _ => {}
        }
    }

    fn write_oam(&mut self, addr: u8, data: u8) {
        self.ppu.oam_write(addr, data);
    }
}

/// The system bus. Owns every subsystem and drives the master clock.
pub struct Bus<H: HostService> {
    /// Master cycle counter (one per video dot).
    cycle: u64,
    /// 2 KB work RAM, mirrored across $0000-$1FFF.
    wram: [u8; 0x800],
    cpu: Cpu,
    ppu: Ppu,
    apu: Apu,
    input: Input,
    mapper: Mapper,
    host: H,
    /// Pending OAM-DMA page from a $4014 write.
    dma_request: Option<u8>,
}

impl<H: HostService> Bus<H> {
    /// Build the full system around a cartridge image and run the RESET
    /// sequence.
    ///
    /// # Errors
    ///
    /// Fails when the image is malformed or names an unsupported mapper.
    pub fn new(rom: &[u8], host: H) -> Result<Self, EmulatorError> {
        let cartridge = Cartridge::new(rom)?;
        let mapper = Mapper::new(cartridge)?;

        let mut bus = Self {
            cycle: 0,
            wram: [0; 0x800],
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            input: Input::new(),
            mapper,
            host,
            dma_request: None,
        };
        bus.reset();
        Ok(bus)
    }

    /// Run one master tick. Returns true when the video completes a frame.
    pub fn cycle(&mut self) -> bool {
        if self.cycle % 3 == 0 {
            self.cpu_step();
        }
        if self.cycle % 6 == 0 {
            self.apu_step();
        }
        self.cycle += 1;
        self.video_step()
    }

    /// Dispatch an interrupt line.
    pub fn interrupt(&mut self, kind: Interrupt) {
        match kind {
            Interrupt::Maskable => self.cpu.raise_irq(),
            Interrupt::NonMaskable => self.cpu.raise_nmi(),
            Interrupt::Reset => self.reset(),
            Interrupt::Mapper => {
                if self.mapper.scanline_interrupt() {
                    self.cpu.raise_irq();
                }
            }
        }
    }

    /// Read the processor address space with full side effects.
    pub fn read(&mut self, addr: u16) -> u8 {
        let mut nmi = false;
        let mut irq = false;
        let value = {
            let mut adapter = CpuAdapter {
                wram: &mut self.wram,
                ppu: &mut self.ppu,
                apu: &mut self.apu,
                input: &mut self.input,
                mapper: &mut self.mapper,
                host: &mut self.host,
                dma_request: &mut self.dma_request,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            adapter.read(addr)
        };
        self.apply_signals(nmi, irq);
        value
    }

    /// Write the processor address space with full side effects.
    pub fn write(&mut self, addr: u16, data: u8) {
        let mut nmi = false;
        let mut irq = false;
        {
            let mut adapter = CpuAdapter {
                wram: &mut self.wram,
                ppu: &mut self.ppu,
                apu: &mut self.apu,
                input: &mut self.input,
                mapper: &mut self.mapper,
                host: &mut self.host,
                dma_request: &mut self.dma_request,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            adapter.write(addr, data);
        }
        if let Some(page) = self.dma_request.take() {
            self.cpu.begin_transfer(page);
        }
        self.apply_signals(nmi, irq);
    }

    /// Read the 14-bit video address space.
    pub fn video_read(&mut self, addr: u16) -> u8 {
        let mut nmi = false;
        let mut irq = false;
        let value = {
            let mut adapter = VideoAdapter {
                mapper: &mut self.mapper,
                host: &mut self.host,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            self.ppu.vram_read(&mut adapter, addr)
        };
        self.apply_signals(nmi, irq);
        value
    }

    /// Write the 14-bit video address space.
    pub fn video_write(&mut self, addr: u16, data: u8) {
        let mut nmi = false;
        let mut irq = false;
        {
            let mut adapter = VideoAdapter {
                mapper: &mut self.mapper,
                host: &mut self.host,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            self.ppu.vram_write(&mut adapter, addr, data);
        }
        self.apply_signals(nmi, irq);
    }

    /// Read the video-OAM address space.
    #[must_use]
    pub fn oam_read(&self, addr: u8) -> u8 {
        self.ppu.oam_read(addr)
    }

    /// Write the video-OAM address space.
    pub fn oam_write(&mut self, addr: u8, data: u8) {
        self.ppu.oam_write(addr, data);
    }

    /// Master cycles since power-on or reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Shared handle to the audio output ring buffer.
    #[must_use]
    pub fn audio_buffer(&self) -> Arc<AudioBuffer> {
        self.apu.buffer()
    }

    /// Borrow the CPU (tests and diagnostics).
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Borrow the video core (tests and diagnostics).
    #[must_use]
    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    /// Borrow the mapper (tests and diagnostics).
    #[must_use]
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// Borrow the injected host service.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Reset every subsystem in dependency order and zero the master
    /// cycle. Always non-fatal; the machine re-enters its initialised
    /// state.
    fn reset(&mut self) {
        log::debug!("system reset");
        self.mapper.reset();
        self.apu.reset();
        self.input.reset();

        self.wram = [0; 0x800];
        self.dma_request = None;
        let mut nmi = false;
        let mut irq = false;
        {
            let mut adapter = CpuAdapter {
                wram: &mut self.wram,
                ppu: &mut self.ppu,
                apu: &mut self.apu,
                input: &mut self.input,
                mapper: &mut self.mapper,
                host: &mut self.host,
                dma_request: &mut self.dma_request,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            self.cpu.reset(&mut adapter);
        }

        self.ppu.reset();
        self.cycle = 0;
    }

    /// One CPU cycle behind the adapter, then any DMA trigger captured
    /// from a $4014 write.
    fn cpu_step(&mut self) {
        let mut nmi = false;
        let mut irq = false;
        {
            let mut adapter = CpuAdapter {
                wram: &mut self.wram,
                ppu: &mut self.ppu,
                apu: &mut self.apu,
                input: &mut self.input,
                mapper: &mut self.mapper,
                host: &mut self.host,
                dma_request: &mut self.dma_request,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            self.cpu.step(&mut adapter, self.cycle);
        }
        if let Some(page) = self.dma_request.take() {
            self.cpu.begin_transfer(page);
        }
        self.apply_signals(nmi, irq);
    }

    /// One audio cycle: service a pending DMC fetch, step the unit, and
    /// forward its interrupt line.
    fn apu_step(&mut self) {
        if self.apu.dmc_needs_sample() {
            let addr = self.apu.dmc_sample_address();
            let data = self.mapper.read_rom(addr);
            self.apu.dmc_fill_sample(data);
        }

        self.apu.step();
        if self.apu.irq_pending() {
            self.cpu.raise_irq();
        }
    }

    /// One video dot; forwards collected interrupt edges to the CPU.
    fn video_step(&mut self) -> bool {
        let mut nmi = false;
        let mut irq = false;
        let frame = {
            let mut adapter = VideoAdapter {
                mapper: &mut self.mapper,
                host: &mut self.host,
                nmi: &mut nmi,
                irq: &mut irq,
            };
            self.ppu.step(&mut adapter)
        };
        self.apply_signals(nmi, irq);
        frame
    }

    fn apply_signals(&mut self, nmi: bool, irq: bool) {
        if nmi {
            self.cpu.raise_nmi();
        }
        if irq {
            self.cpu.raise_irq();
        }
    }
}
