//! Spectrum analyzer - Hann-windowed radix-2 FFT over fixed blocks
//!
//! The analyzer accumulates filtered samples into a 1024-slot ring. Each
//! time the ring fills, the block is windowed, transformed in place with an
//! iterative Cooley-Tukey radix-2 FFT, and reduced to 512 linear magnitude
//! bins. Twiddle roots are recomputed per butterfly stage and accumulated
//! multiplicatively within the stage; there is no global twiddle table.
//!
//! Everything here runs on the audio thread and performs no allocation
//! after construction.

use std::f32::consts::PI;

use crate::types::{Sample, FFT_BINS, FFT_SIZE};

/// Minimal complex scalar for the transform's working buffer
#[derive(Debug, Clone, Copy, Default)]
struct Complex {
    re: f32,
    im: f32,
}

impl Complex {
    #[inline]
    fn add(self, other: Complex) -> Complex {
        Complex {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline]
    fn sub(self, other: Complex) -> Complex {
        Complex {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }

    #[inline]
    fn mul(self, other: Complex) -> Complex {
        Complex {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    #[inline]
    fn abs(self) -> f32 {
        (self.re * self.re + self.im * self.im).sqrt()
    }
}

/// Windowed radix-2 spectrum analyzer over 1024-sample blocks
pub struct SpectrumAnalyzer {
    /// Hann window table, evaluated once at construction
    window: [Sample; FFT_SIZE],
    /// Incoming sample ring; consumed whole on each transform
    ring: [Sample; FFT_SIZE],
    /// Write position in `ring`, always in `[0, FFT_SIZE)`
    cursor: usize,
    /// Working buffer for the in-place transform
    scratch: [Complex; FFT_SIZE],
    /// Most recent normalized magnitudes
    magnitudes: [Sample; FFT_BINS],
}

impl SpectrumAnalyzer {
    /// Create an analyzer with a zeroed ring and spectrum
    pub fn new() -> Self {
        let mut window = [0.0; FFT_SIZE];
        for (i, w) in window.iter_mut().enumerate() {
            *w = 0.5 * (1.0 - (2.0 * PI * i as f32 / (FFT_SIZE - 1) as f32).cos());
        }
        Self {
            window,
            ring: [0.0; FFT_SIZE],
            cursor: 0,
            scratch: [Complex::default(); FFT_SIZE],
            magnitudes: [0.0; FFT_BINS],
        }
    }

    /// Push one sample into the ring
    ///
    /// Returns true when the push completed a block: the transform has run
    /// and [`magnitudes`](Self::magnitudes) holds a fresh spectrum. The
    /// cursor wraps to zero afterwards.
    #[inline]
    pub fn push(&mut self, sample: Sample) -> bool {
        self.ring[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor == FFT_SIZE {
            self.cursor = 0;
            self.transform();
            true
        } else {
            false
        }
    }

    /// The most recently computed magnitude spectrum, `|X[k]| / (N/2)`
    pub fn magnitudes(&self) -> &[Sample; FFT_BINS] {
        &self.magnitudes
    }

    /// Clear the ring, cursor, and published magnitudes
    pub fn reset(&mut self) {
        self.ring = [0.0; FFT_SIZE];
        self.cursor = 0;
        self.magnitudes = [0.0; FFT_BINS];
    }

    fn transform(&mut self) {
        // Window into the complex working buffer (imaginary part zero).
        for i in 0..FFT_SIZE {
            self.scratch[i] = Complex {
                re: self.ring[i] * self.window[i],
                im: 0.0,
            };
        }

        // Bit-reversal permutation, in place.
        let mut j = 0;
        for i in 1..FFT_SIZE {
            let mut bit = FFT_SIZE >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j ^= bit;
            if i < j {
                self.scratch.swap(i, j);
            }
        }

        // Decimation-in-time butterflies, stage lengths 2..=FFT_SIZE.
        let mut len = 2;
        while len <= FFT_SIZE {
            let angle = -2.0 * PI / len as f32;
            let wlen = Complex {
                re: angle.cos(),
                im: angle.sin(),
            };
            let mut base = 0;
            while base < FFT_SIZE {
                let mut w = Complex { re: 1.0, im: 0.0 };
                for k in 0..len / 2 {
                    let u = self.scratch[base + k];
                    let v = self.scratch[base + k + len / 2].mul(w);
                    self.scratch[base + k] = u.add(v);
                    self.scratch[base + k + len / 2] = u.sub(v);
                    w = w.mul(wlen);
                }
                base += len;
            }
            len <<= 1;
        }

        // Linear magnitudes for the meaningful half, normalized by N/2.
        for k in 0..FFT_BINS {
            self.magnitudes[k] = self.scratch[k].abs() / (FFT_SIZE as f32 / 2.0);
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed exactly one block of the given generator into a fresh analyzer.
    fn analyze(f: impl Fn(usize) -> Sample) -> [Sample; FFT_BINS] {
        let mut analyzer = SpectrumAnalyzer::new();
        for i in 0..FFT_SIZE {
            let done = analyzer.push(f(i));
            assert_eq!(done, i == FFT_SIZE - 1);
        }
        *analyzer.magnitudes()
    }

    #[test]
    fn test_silence_yields_zero_spectrum() {
        let mags = analyze(|_| 0.0);
        assert!(mags.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_bin_centered_sine_peaks_in_its_bin() {
        let bin = 9;
        let mags = analyze(|i| {
            (2.0 * PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin()
        });

        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, bin);

        // Unit sine, Hann window: half the signal energy lands at the bin,
        // scaled by the window's coherent gain of 0.5.
        assert!((mags[bin] - 0.5).abs() < 0.01, "peak = {}", mags[bin]);

        // The Hann main lobe spans the +/-1 neighbours (at -6 dB); every bin
        // outside it must sit at least 20 dB below the peak.
        let floor = mags[bin] / 10.0;
        for (k, &m) in mags.iter().enumerate() {
            if k + 1 < bin || k > bin + 1 {
                assert!(m < floor, "bin {} leaks: {} vs floor {}", k, m, floor);
            }
        }
    }

    #[test]
    fn test_two_tones_resolve_separately() {
        let mags = analyze(|i| {
            let t = i as f32 / FFT_SIZE as f32;
            (2.0 * PI * 16.0 * t).sin() + 0.5 * (2.0 * PI * 100.0 * t).sin()
        });
        assert!((mags[16] - 0.5).abs() < 0.01);
        assert!((mags[100] - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_cursor_wraps_between_blocks() {
        let mut analyzer = SpectrumAnalyzer::new();
        // A block and a half: exactly one transform fires.
        let mut transforms = 0;
        for _ in 0..FFT_SIZE + FFT_SIZE / 2 {
            if analyzer.push(0.1) {
                transforms += 1;
            }
        }
        assert_eq!(transforms, 1);
        // Completing the second block fires again.
        for _ in 0..FFT_SIZE / 2 {
            if analyzer.push(0.1) {
                transforms += 1;
            }
        }
        assert_eq!(transforms, 2);
    }

    #[test]
    fn test_magnitude_array_length() {
        let analyzer = SpectrumAnalyzer::new();
        assert_eq!(analyzer.magnitudes().len(), 512);
    }
}
