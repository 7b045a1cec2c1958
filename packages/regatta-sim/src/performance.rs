//! performance.rs - J/111 polar lookup
//!
//! Target boat speed in knots for a true wind angle and true wind speed,
//! bilinear in angle and wind bracket. Separate tables with and without
//! the spinnaker: the kite is slow upwind and fast from a beam reach down.

/// True wind angles of the table columns, degrees
const ANGLES: [f64; 13] = [0.0, 30.0, 38.0, 45.0, 52.0, 60.0, 75.0, 90.0, 110.0, 120.0, 135.0, 150.0, 180.0];

struct WindRow {
    tws: f64,
    spinnaker: [f64; 13],
    non_spinnaker: [f64; 13],
}

const J111: [WindRow; 7] = [
    WindRow {
        tws: 6.0,
        spinnaker: [0.0, 0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 5.46, 5.5, 5.48, 5.25, 4.72, 4.01],
        non_spinnaker: [0.0, 0.0, 4.7, 4.93, 5.18, 5.29, 5.36, 5.46, 4.94, 4.65, 4.08, 3.51, 3.01],
    },
    WindRow {
        tws: 8.0,
        spinnaker: [0.0, 0.0, 0.6, 1.2, 1.8, 2.4, 3.5, 6.79, 6.87, 6.85, 6.58, 5.94, 5.06],
        non_spinnaker: [0.0, 0.0, 5.8, 6.09, 6.41, 6.55, 6.65, 6.79, 6.17, 5.82, 5.12, 4.42, 3.8],
    },
    WindRow {
        tws: 10.0,
        spinnaker: [0.0, 0.0, 0.7, 1.4, 2.1, 2.8, 4.0, 7.89, 8.01, 8.01, 7.72, 6.99, 6.0],
        non_spinnaker: [0.0, 0.0, 6.66, 7.0, 7.38, 7.56, 7.7, 7.89, 7.2, 6.8, 6.0, 5.2, 4.5],
    },
    WindRow {
        tws: 12.0,
        spinnaker: [0.0, 0.0, 0.8, 1.6, 2.4, 3.2, 4.5, 8.6, 8.74, 8.75, 8.44, 7.65, 6.58],
        non_spinnaker: [0.0, 0.0, 7.23, 7.6, 8.02, 8.22, 8.38, 8.6, 7.85, 7.42, 6.56, 5.69, 4.93],
    },
    WindRow {
        tws: 14.0,
        spinnaker: [0.0, 0.0, 0.9, 1.8, 2.7, 3.6, 5.0, 9.01, 9.18, 9.2, 8.89, 8.08, 6.98],
        non_spinnaker: [0.0, 0.0, 7.52, 7.91, 8.36, 8.57, 8.76, 9.01, 8.25, 7.81, 6.91, 6.01, 5.23],
    },
    WindRow {
        tws: 16.0,
        spinnaker: [0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.5, 9.42, 9.66, 9.7, 9.42, 8.59, 7.47],
        non_spinnaker: [0.0, 0.0, 7.76, 8.18, 8.66, 8.9, 9.13, 9.42, 8.68, 8.24, 7.32, 6.39, 5.61],
    },
    WindRow {
        tws: 20.0,
        spinnaker: [0.0, 0.0, 1.2, 2.4, 3.6, 4.8, 6.5, 10.43, 10.87, 11.01, 10.81, 9.98, 8.88],
        non_spinnaker: [0.0, 0.0, 8.2, 8.7, 9.26, 9.6, 9.98, 10.43, 9.77, 9.35, 8.4, 7.42, 6.66],
    },
];

/// Target speed in knots. `twa` is radians, either sign; `tws` in knots.
/// Below the lightest bracket the speed ramps linearly from zero; above
/// the heaviest it is clamped.
pub fn target_speed(twa: f64, spinnaker: bool, tws: f64) -> f64 {
    if !twa.is_finite() || !tws.is_finite() || tws <= 0.0 {
        return 0.0;
    }
    let twa_deg = twa.abs().to_degrees().min(180.0);
    let row_speed = |row: &WindRow| {
        let table = if spinnaker { &row.spinnaker } else { &row.non_spinnaker };
        interpolate_angle(table, twa_deg)
    };

    let lightest = &J111[0];
    if tws < lightest.tws {
        return row_speed(lightest) * tws / lightest.tws;
    }
    for pair in J111.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if tws <= hi.tws {
            let t = (tws - lo.tws) / (hi.tws - lo.tws);
            let (s1, s2) = (row_speed(lo), row_speed(hi));
            return s1 + (s2 - s1) * t;
        }
    }
    row_speed(&J111[J111.len() - 1])
}

fn interpolate_angle(table: &[f64; 13], twa_deg: f64) -> f64 {
    for i in 0..ANGLES.len() - 1 {
        if twa_deg >= ANGLES[i] && twa_deg <= ANGLES[i + 1] {
            let t = (twa_deg - ANGLES[i]) / (ANGLES[i + 1] - ANGLES[i]);
            return table[i] + (table[i + 1] - table[i]) * t;
        }
    }
    table[table.len() - 1]
}
