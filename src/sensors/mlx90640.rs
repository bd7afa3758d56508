//! MLX90640 32×24 far-infrared thermal array.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: talks to the vendored Melexis driver component
//! (`components/mlx90640`) through a narrow C boundary. EEPROM parameter
//! extraction and per-pixel compensation live entirely in that component.
//! On host/test: serves a synthetic ambient scene, with injectable frames
//! and faults.
//!
//! ## Control register (0x800D)
//!
//! ```text
//!  bit 12      : readout mode   (0 = interleaved, 1 = chess)
//!  bits 11..10 : ADC resolution (0 = 16-bit .. 3 = 19-bit)
//!  bits  9..7  : refresh rate   (0 = 0.5 Hz .. 7 = 64 Hz)
//! ```

use log::info;
#[cfg(not(target_os = "espidf"))]
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::FrameSource;
use crate::error::AcquisitionError;
use crate::frame::Geometry;

/// Default 7-bit I2C address.
pub const I2C_ADDR_DEFAULT: u8 = 0x33;

/// Native pixel array.
pub const NATIVE_GEOMETRY: Geometry = Geometry::new(24, 32);

/// Emissivity used for object temperature calculation.
#[cfg(target_os = "espidf")]
const EMISSIVITY: f32 = 0.95;

const MODE_SHIFT: u16 = 12;
const RESOLUTION_SHIFT: u16 = 10;
const REFRESH_SHIFT: u16 = 7;

/// Control register value after power-on: subpage mode on, chess, 18-bit, 2 Hz.
#[cfg(not(target_os = "espidf"))]
const POWER_ON_CONTROL: u16 = 0x1901;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadoutMode {
    Interleaved,
    Chess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Adc16Bit,
    Adc17Bit,
    Adc18Bit,
    Adc19Bit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshRate {
    Hz0_5,
    Hz1,
    Hz2,
    Hz4,
    Hz8,
    Hz16,
    Hz32,
    Hz64,
}

impl core::fmt::Display for ReadoutMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interleaved => write!(f, "Interleave"),
            Self::Chess => write!(f, "Chess"),
        }
    }
}

impl core::fmt::Display for Resolution {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} bit", 16 + *self as u8)
    }
}

impl core::fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Hz0_5 => write!(f, "0.5 Hz"),
            Self::Hz1 => write!(f, "1 Hz"),
            Self::Hz2 => write!(f, "2 Hz"),
            Self::Hz4 => write!(f, "4 Hz"),
            Self::Hz8 => write!(f, "8 Hz"),
            Self::Hz16 => write!(f, "16 Hz"),
            Self::Hz32 => write!(f, "32 Hz"),
            Self::Hz64 => write!(f, "64 Hz"),
        }
    }
}

impl RefreshRate {
    const ALL: [Self; 8] = [
        Self::Hz0_5,
        Self::Hz1,
        Self::Hz2,
        Self::Hz4,
        Self::Hz8,
        Self::Hz16,
        Self::Hz32,
        Self::Hz64,
    ];
}

impl Resolution {
    const ALL: [Self; 4] = [
        Self::Adc16Bit,
        Self::Adc17Bit,
        Self::Adc18Bit,
        Self::Adc19Bit,
    ];
}

/// Readout settings written to the control register at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSettings {
    pub mode: ReadoutMode,
    pub resolution: Resolution,
    pub refresh_rate: RefreshRate,
}

impl SensorSettings {
    pub fn from_config(config: &crate::config::SystemConfig) -> Self {
        Self {
            mode: config.readout_mode,
            resolution: config.resolution,
            refresh_rate: config.refresh_rate,
        }
    }

    /// Merge these settings into an existing control register value.
    pub fn apply_to(&self, control: u16) -> u16 {
        let mut reg = control;
        reg &= !((0b1 << MODE_SHIFT) | (0b11 << RESOLUTION_SHIFT) | (0b111 << REFRESH_SHIFT));
        if self.mode == ReadoutMode::Chess {
            reg |= 1 << MODE_SHIFT;
        }
        reg |= (self.resolution as u16) << RESOLUTION_SHIFT;
        reg |= (self.refresh_rate as u16) << REFRESH_SHIFT;
        reg
    }

    /// Decode the settings held in a control register value.
    pub fn from_control(control: u16) -> Self {
        let mode = if (control >> MODE_SHIFT) & 1 == 1 {
            ReadoutMode::Chess
        } else {
            ReadoutMode::Interleaved
        };
        Self {
            mode,
            resolution: Resolution::ALL[((control >> RESOLUTION_SHIFT) & 0b11) as usize],
            refresh_rate: RefreshRate::ALL[((control >> REFRESH_SHIFT) & 0b111) as usize],
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" {
    /// Dump EEPROM, extract calibration and read the 3-word serial number.
    /// Returns 0 on success, negative on bus error.
    fn heatwatch_mlx90640_init(addr: u8, serial: *mut u16) -> i32;

    fn heatwatch_mlx90640_read_control(addr: u8, control: *mut u16) -> i32;

    fn heatwatch_mlx90640_write_control(addr: u8, control: u16) -> i32;

    /// Read until both subpages are compensated and write °C into `out`.
    /// Returns the number of samples written, negative on bus error or an
    /// incomplete frame.
    fn heatwatch_mlx90640_read_frame(addr: u8, emissivity: f32, out: *mut f32, len: usize)
    -> i32;
}

/// One injected simulation outcome.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone)]
enum SimRead {
    Frame(Vec<f32>),
    Fault(AcquisitionError),
}

pub struct Mlx90640 {
    addr: u8,
    settings: SensorSettings,
    serial: Option<[u16; 3]>,
    #[cfg(not(target_os = "espidf"))]
    sim_queue: std::collections::VecDeque<SimRead>,
    #[cfg(not(target_os = "espidf"))]
    sim_ambient_c: f32,
    #[cfg(not(target_os = "espidf"))]
    sim_control: u16,
}

impl Mlx90640 {
    pub fn new(addr: u8, settings: SensorSettings) -> Self {
        Self {
            addr,
            settings,
            serial: None,
            #[cfg(not(target_os = "espidf"))]
            sim_queue: std::collections::VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_ambient_c: 22.0,
            #[cfg(not(target_os = "espidf"))]
            sim_control: POWER_ON_CONTROL,
        }
    }

    /// Probe the sensor and apply the readout settings.
    ///
    /// The control register is read, merged and written back, so bits
    /// outside the readout settings (subpage mode among them) keep their
    /// power-on values. Logs the serial number and the settings the sensor
    /// reports back.
    pub fn begin(&mut self) -> Result<SensorSettings, AcquisitionError> {
        let serial = self.platform_init()?;
        let current = self.platform_read_control()?;
        self.platform_write_control(self.settings.apply_to(current))?;
        let effective = self.platform_read_control()?;
        self.serial = Some(serial);
        let readback = SensorSettings::from_control(effective);

        info!(
            "MLX90640: found at 0x{:02X}, serial {:04X}{:04X}{:04X}",
            self.addr, serial[0], serial[1], serial[2]
        );
        info!(
            "MLX90640: mode={} resolution={} rate={}",
            readback.mode, readback.resolution, readback.refresh_rate
        );
        Ok(readback)
    }

    pub fn serial_number(&self) -> Option<[u16; 3]> {
        self.serial
    }

    pub fn settings(&self) -> SensorSettings {
        self.settings
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<[u16; 3], AcquisitionError> {
        let mut serial = [0u16; 3];
        // SAFETY: `serial` is a live local of the 3 words the component writes.
        let rc = unsafe { heatwatch_mlx90640_init(self.addr, serial.as_mut_ptr()) };
        if rc != 0 {
            log::error!("MLX90640: init failed (rc={})", rc);
            return Err(AcquisitionError::SensorNotFound);
        }
        Ok(serial)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> Result<[u16; 3], AcquisitionError> {
        info!("MLX90640(sim): init at 0x{:02X}", self.addr);
        Ok([0x00AB, 0x1234, 0xCDEF])
    }

    #[cfg(target_os = "espidf")]
    fn platform_read_control(&mut self) -> Result<u16, AcquisitionError> {
        let mut control: u16 = 0;
        // SAFETY: `control` is a live local word.
        let rc = unsafe { heatwatch_mlx90640_read_control(self.addr, &mut control) };
        if rc != 0 {
            return Err(AcquisitionError::HardwareFault(rc));
        }
        Ok(control)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read_control(&mut self) -> Result<u16, AcquisitionError> {
        Ok(self.sim_control)
    }

    #[cfg(target_os = "espidf")]
    fn platform_write_control(&mut self, control: u16) -> Result<(), AcquisitionError> {
        // SAFETY: plain value call, no pointers cross the boundary.
        let rc = unsafe { heatwatch_mlx90640_write_control(self.addr, control) };
        if rc != 0 {
            log::error!("MLX90640: control write 0x{:04X} failed (rc={})", control, rc);
            return Err(AcquisitionError::HardwareFault(rc));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_write_control(&mut self, control: u16) -> Result<(), AcquisitionError> {
        self.sim_control = control;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_read(&mut self, out: &mut [f32]) -> Result<usize, AcquisitionError> {
        // SAFETY: `out` is a live, exclusively borrowed slice of `out.len()` floats.
        let rc = unsafe {
            heatwatch_mlx90640_read_frame(self.addr, EMISSIVITY, out.as_mut_ptr(), out.len())
        };
        if rc < 0 {
            return Err(AcquisitionError::HardwareFault(rc));
        }
        Ok(rc as usize)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read(&mut self, out: &mut [f32]) -> Result<usize, AcquisitionError> {
        match self.sim_queue.pop_front() {
            Some(SimRead::Frame(frame)) => {
                let n = frame.len().min(out.len());
                out[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            Some(SimRead::Fault(e)) => {
                warn!("MLX90640(sim): injected fault {}", e);
                Err(e)
            }
            None => {
                // Ambient scene with a gentle vertical gradient.
                let cols = NATIVE_GEOMETRY.cols();
                for (i, t) in out.iter_mut().enumerate() {
                    *t = self.sim_ambient_c + (i / cols) as f32 * 0.05;
                }
                Ok(out.len())
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Mlx90640 {
    /// Queue a frame to be returned by the next read.
    pub fn sim_push_frame(&mut self, samples: Vec<f32>) {
        self.sim_queue.push_back(SimRead::Frame(samples));
    }

    /// Queue a failure to be returned by the next read.
    pub fn sim_push_fault(&mut self, error: AcquisitionError) {
        self.sim_queue.push_back(SimRead::Fault(error));
    }

    /// Current value of the simulated control register.
    pub fn sim_control(&self) -> u16 {
        self.sim_control
    }

    /// Ambient temperature of the synthetic scene.
    pub fn sim_set_ambient(&mut self, celsius: f32) {
        self.sim_ambient_c = celsius;
    }
}

impl FrameSource for Mlx90640 {
    fn read_frame(&mut self, out: &mut [f32]) -> Result<usize, AcquisitionError> {
        if self.serial.is_none() {
            return Err(AcquisitionError::SensorNotFound);
        }
        self.platform_read(out)
    }
}
