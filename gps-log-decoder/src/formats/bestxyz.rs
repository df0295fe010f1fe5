//! `#BESTXYZA` decoder - best available Cartesian position/velocity solution

use super::{row_prefix, split_novatel};

/// Body field names of the BESTXYZ log, in wire order
pub(crate) const BODY_COLUMNS: &[&str] = &[
    "p_sol_status",
    "pos_type",
    "p_x",
    "p_y",
    "p_z",
    "p_x_sigma",
    "p_y_sigma",
    "p_z_sigma",
    "v_sol_status",
    "vel_type",
    "v_x",
    "v_y",
    "v_z",
    "v_x_sigma",
    "v_y_sigma",
    "v_z_sigma",
    "station_id",
    "v_latency",
    "diff_age",
    "sol_age",
    "num_svs",
    "num_soln_svs",
    "num_gg_l1",
    "num_soln_multi_svs",
    "reserved",
    "ext_sol_stat",
    "galileo_beidou_sig_mask",
    "gps_glonass_sig_mask",
];

/// Decode one `#BESTXYZA` line into its output row
pub fn decode(timestamp: &str, line: &str) -> Option<Vec<String>> {
    let (marker, header, body) = split_novatel(line)?;
    if body.len() < BODY_COLUMNS.len() {
        return None;
    }

    let mut row = row_prefix(timestamp, marker, &header);
    row.extend(
        body[..BODY_COLUMNS.len()]
            .iter()
            .map(|f| f.trim_matches('"').to_string()),
    );
    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "#BESTXYZA,COM1,0,55.0,FINESTEERING,2167,144140.000,02000040,d821,32768;SOL_COMPUTED,NARROW_INT,-1634531.5683,-3664618.0326,4942496.3270,0.0099,0.0219,0.0115,SOL_COMPUTED,NARROW_INT,0.0011,-0.0049,-0.0001,0.0199,0.0439,0.0230,\"AAAA\",0.250,1.000,0.000,12,11,11,11,0,01,0,33*e9eafeca";

    #[test]
    fn test_decode() {
        let row = decode("2021-07-19 16:02:20.000", LINE).unwrap();
        assert_eq!(row.len(), 2 + 9 + BODY_COLUMNS.len());
        assert_eq!(row[0], "2021-07-19 16:02:20.000");
        assert_eq!(row[1], "#BESTXYZA");
        assert_eq!(row[6], "2167"); // week
        assert_eq!(row[11], "SOL_COMPUTED");
        assert_eq!(row[13], "-1634531.5683"); // p_x, kept as decimal text
        assert_eq!(row[27], "AAAA"); // station id, quotes stripped
        assert_eq!(row[38], "33");
    }

    #[test]
    fn test_decode_is_idempotent() {
        assert_eq!(decode("t", LINE), decode("t", LINE));
    }

    #[test]
    fn test_short_body_fails() {
        let truncated = "#BESTXYZA,COM1,0,55.0,FINESTEERING,2167,144140.000,02000040,d821,32768;SOL_COMPUTED,NARROW_INT,-1634531.5683*e9eafeca";
        assert!(decode("t", truncated).is_none());
    }
}
