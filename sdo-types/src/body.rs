use crate::{SdoError, SdoResult, BODY_SAMPLES, NUM_DIPOLES, NUM_POLARIZATIONS, NUM_SUBBANDS};

/// Один временной срез: 8 поддиапазонов × 96 диполей × 2 поляризации × [re, im].
///
/// Порядок отсчётов: subband → dipole → pol → (re, im).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdoBody {
    samples: Vec<i16>,
}

impl SdoBody {
    /// Срез, заполненный нулями.
    pub fn zeroed() -> Self {
        Self {
            samples: vec![0; BODY_SAMPLES],
        }
    }

    /// Создаёт срез из готовых отсчётов. Длина должна быть ровно [`BODY_SAMPLES`].
    pub fn from_samples(samples: Vec<i16>) -> SdoResult<Self> {
        if samples.len() != BODY_SAMPLES {
            return Err(SdoError::invalid_length(BODY_SAMPLES, samples.len()));
        }

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    /// Линейный индекс отсчёта `re` для (subband, dipole, pol).
    pub fn index_of(
        subband: usize,
        dipole: usize,
        pol: usize,
    ) -> SdoResult<usize> {
        if subband >= NUM_SUBBANDS || dipole >= NUM_DIPOLES || pol >= NUM_POLARIZATIONS {
            return Err(SdoError::out_of_range(format!(
                "subband={subband} dipole={dipole} pol={pol}"
            )));
        }

        Ok(((subband * NUM_DIPOLES + dipole) * NUM_POLARIZATIONS + pol) * 2)
    }

    /// Комплексный отсчёт `(re, im)`.
    pub fn sample(
        &self,
        subband: usize,
        dipole: usize,
        pol: usize,
    ) -> SdoResult<(i16, i16)> {
        let i = Self::index_of(subband, dipole, pol)?;
        Ok((self.samples[i], self.samples[i + 1]))
    }

    pub fn set_sample(
        &mut self,
        subband: usize,
        dipole: usize,
        pol: usize,
        value: (i16, i16),
    ) -> SdoResult<()> {
        let i = Self::index_of(subband, dipole, pol)?;
        self.samples[i] = value.0;
        self.samples[i + 1] = value.1;
        Ok(())
    }
}

impl Default for SdoBody {
    fn default() -> Self {
        Self::zeroed()
    }
}
