//! Small gearbox shared by unit tests.

use crate::config::{GearboxConfig, SampleDistribution};

/// 10/15 teeth at 10 Hz, 0.2 s at 5 kHz, two failing input teeth and one
/// failing output tooth with tight state distributions.
pub(crate) fn small_config() -> GearboxConfig {
    let mut config = GearboxConfig::reference();
    config.simulation.rotational_frequency_in = 10.0;
    config.simulation.sample_interval = 0.2;
    config.simulation.sample_rate = 5000.0;
    config.simulation.seed = Some(7);
    config.gear_in.no_teeth = 10;
    config.gear_out.no_teeth = 15;

    for (gear, failing) in [(&mut config.gear_in, 2), (&mut config.gear_out, 1)] {
        let deg = &mut gear.degradation;
        deg.failing_teeth = failing;
        deg.n0 = SampleDistribution::Normal { mean: 1e6, std: 5e4 };
        deg.a0 = SampleDistribution::Normal { mean: 0.3, std: 0.02 };
        deg.neol = SampleDistribution::Normal { mean: 5e6, std: 2e5 };
        deg.aeol = SampleDistribution::Normal { mean: 4.0, std: 0.0 };
    }
    config
}
