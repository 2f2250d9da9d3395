//! Reduces the land-cover classification stream into per-county pixel
//! weights.
//!
//! Input rows are tab-separated `(geoid, x, y, cover_code, area_m2)` and
//! must arrive with same-(county, pixel) rows contiguous; callers that
//! cannot guarantee that must pre-sort. Each pixel's weight is the summed
//! area of its target-crop codes; per county, positive weights are
//! normalized to sum to one and zero-weight pixels are dropped entirely.

use log::debug;

use crate::gazetteer::CountyId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverRow {
    pub geoid: CountyId,
    pub x: u32,
    pub y: u32,
    pub code: u8,
    pub area: f64,
}

/// Turns one raw line into a typed row. Lines that do not split into
/// exactly five fields, or fail typed parsing, yield `None`; the land
/// cover dumps carry stray text between blocks.
pub fn parse_cover_line(line: &str) -> Option<CoverRow> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 5 {
        if !line.trim().is_empty() {
            debug!("skipping non-data line {:?}", line);
        }
        return None;
    }
    let parsed = (|| -> Option<CoverRow> {
        Some(CoverRow {
            geoid: fields[0].trim().parse().ok()?,
            x: fields[1].trim().parse().ok()?,
            y: fields[2].trim().parse().ok()?,
            code: fields[3].trim().parse().ok()?,
            area: fields[4].trim().parse().ok()?,
        })
    })();
    if parsed.is_none() {
        debug!("skipping unparseable cover row {:?}", line);
    }
    parsed
}

/// Reduces a 256-bucket area histogram to a pixel weight: the summed
/// area of the codes in the target set.
pub struct WeightFunction {
    mask: [bool; 256],
}

impl WeightFunction {
    pub fn new(target_codes: &[u8]) -> Self {
        let mut mask = [false; 256];
        for &code in target_codes {
            mask[code as usize] = true;
        }
        WeightFunction { mask }
    }

    pub fn apply(&self, areas: &[f64; 256]) -> f64 {
        areas
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, &masked)| masked)
            .map(|(&area, _)| area)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelWeight {
    pub geoid: CountyId,
    pub x: u32,
    pub y: u32,
    pub weight: f64,
}

/// Streaming stage: accumulates the per-(county, pixel) histogram and
/// emits one `PixelWeight` when the group changes.
pub struct ApplyWeights<'a, I: Iterator<Item = CoverRow>> {
    rows: I,
    function: &'a WeightFunction,
    current: Option<(CountyId, u32, u32)>,
    areas: Box<[f64; 256]>,
}

impl<'a, I: Iterator<Item = CoverRow>> ApplyWeights<'a, I> {
    pub fn new(rows: I, function: &'a WeightFunction) -> Self {
        ApplyWeights {
            rows,
            function,
            current: None,
            areas: Box::new([0.0; 256]),
        }
    }

    fn emit(&mut self, group: (CountyId, u32, u32)) -> PixelWeight {
        let weight = self.function.apply(&self.areas);
        self.areas.fill(0.0);
        PixelWeight {
            geoid: group.0,
            x: group.1,
            y: group.2,
            weight,
        }
    }
}

impl<'a, I: Iterator<Item = CoverRow>> Iterator for ApplyWeights<'a, I> {
    type Item = PixelWeight;

    fn next(&mut self) -> Option<PixelWeight> {
        loop {
            match self.rows.next() {
                Some(row) => {
                    let group = (row.geoid, row.x, row.y);
                    match self.current {
                        Some(open) if open == group => {
                            self.areas[row.code as usize] += row.area;
                        }
                        Some(open) => {
                            let pixel = self.emit(open);
                            self.current = Some(group);
                            self.areas[row.code as usize] += row.area;
                            return Some(pixel);
                        }
                        None => {
                            self.current = Some(group);
                            self.areas[row.code as usize] += row.area;
                        }
                    }
                }
                None => {
                    let open = self.current.take()?;
                    return Some(self.emit(open));
                }
            }
        }
    }
}

/// A county's weighted pixel set. `weights` sums to one over the listed
/// pixels; pixels whose weight reduced to zero are not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountyPixels {
    pub geoid: CountyId,
    pub xs: Vec<u32>,
    pub ys: Vec<u32>,
    pub weights: Vec<f64>,
}

/// Streaming stage: groups pixel weights by contiguous county runs,
/// keeps the positive ones, and normalizes per county. Counties whose
/// total weight is zero are skipped, not emitted.
pub struct CountyGroups<I: Iterator<Item = PixelWeight>> {
    weights: I,
    current: Option<CountyPixels>,
}

impl<I: Iterator<Item = PixelWeight>> CountyGroups<I> {
    pub fn new(weights: I) -> Self {
        CountyGroups {
            weights,
            current: None,
        }
    }

    fn finish(group: CountyPixels) -> Option<CountyPixels> {
        if group.weights.is_empty() {
            return None;
        }
        let total: f64 = group.weights.iter().sum();
        let mut group = group;
        for weight in &mut group.weights {
            *weight /= total;
        }
        Some(group)
    }
}

impl<I: Iterator<Item = PixelWeight>> Iterator for CountyGroups<I> {
    type Item = CountyPixels;

    fn next(&mut self) -> Option<CountyPixels> {
        loop {
            match self.weights.next() {
                Some(pixel) => {
                    let same_county = self
                        .current
                        .as_ref()
                        .map(|group| group.geoid == pixel.geoid)
                        .unwrap_or(false);

                    let done = if same_county {
                        None
                    } else {
                        let previous = self.current.take();
                        self.current = Some(CountyPixels {
                            geoid: pixel.geoid,
                            ..CountyPixels::default()
                        });
                        previous.and_then(Self::finish)
                    };

                    if pixel.weight > 0.0 {
                        let group = self.current.as_mut().unwrap();
                        group.xs.push(pixel.x);
                        group.ys.push(pixel.y);
                        group.weights.push(pixel.weight);
                    }

                    if done.is_some() {
                        return done;
                    }
                }
                None => {
                    return self.current.take().and_then(Self::finish);
                }
            }
        }
    }
}

/// Full reduction from raw lines to normalized county pixel sets, in
/// stream order.
pub fn build<I>(lines: I, target_codes: &[u8]) -> Vec<CountyPixels>
where
    I: Iterator<Item = String>,
{
    let function = WeightFunction::new(target_codes);
    let rows = lines.filter_map(|line| parse_cover_line(&line));
    CountyGroups::new(ApplyWeights::new(rows, &function)).collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Mirrors the shape of the real land-cover dumps, including the
    // stray non-data line.
    const SAMPLE: &str = "\
28104\t784\t663\t112\t11163.5
28107\t784\t662\t111\t36163.5
28107\t784\t662\t121\t25091.9
Other crap.
28107\t784\t662\t122\t22147.2
28107\t784\t662\t141\t48570.4
28107\t784\t662\t142\t4051.59
28107\t784\t662\t152\t37061.7
28107\t784\t662\t181\t12041.9
28107\t784\t662\t190\t7566.78
28107\t784\t662\t195\t2266.32
28107\t784\t663\t121\t7566.78
28107\t784\t663\t195\t2266.32
28108\t784\t662\t121\t2.32
";

    fn sample_counties(codes: &[u8]) -> Vec<CountyPixels> {
        build(SAMPLE.lines().map(String::from), codes)
    }

    #[test]
    fn should_parse_data_lines_only() {
        assert_eq!(
            parse_cover_line("28107\t784\t662\t121\t25091.9"),
            Some(CoverRow {
                geoid: 28107,
                x: 784,
                y: 662,
                code: 121,
                area: 25091.9
            })
        );
        assert_eq!(parse_cover_line("Other crap."), None);
        assert_eq!(parse_cover_line(""), None);
        assert_eq!(parse_cover_line("a\tb\tc\td\te"), None);
    }

    #[test]
    fn should_sum_target_areas_only() {
        let function = WeightFunction::new(&[121, 122, 181]);
        let mut areas = [0.0f64; 256];
        areas[121] = 10.0;
        areas[122] = 5.0;
        areas[181] = 1.0;
        areas[111] = 100.0;
        assert!((function.apply(&areas) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn should_drop_zero_weight_counties() {
        // 28104 has no target-code area at all, so it never appears
        let counties = sample_counties(&[121, 122, 181]);
        let geoids: Vec<u32> = counties.iter().map(|c| c.geoid).collect();
        assert_eq!(geoids, vec![28107, 28108]);
    }

    #[test]
    fn should_normalize_weights_per_county() {
        let counties = sample_counties(&[121, 122, 181]);
        for county in &counties {
            let total: f64 = county.weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "county {}", county.geoid);
        }

        let c28107 = &counties[0];
        assert_eq!(c28107.xs, vec![784, 784]);
        assert_eq!(c28107.ys, vec![662, 663]);
        // pixel 662 holds 121+122+181, pixel 663 holds only 121
        let w662 = 25091.9 + 22147.2 + 12041.9;
        let w663 = 7566.78;
        assert!((c28107.weights[0] - w662 / (w662 + w663)).abs() < 1e-9);
        assert!((c28107.weights[1] - w663 / (w662 + w663)).abs() < 1e-9);
    }

    #[test]
    fn should_give_single_pixel_full_weight() {
        // both rows of pixel (784,662) are target codes, one pixel total
        let lines = [
            "28107\t784\t662\t121\t7566.78",
            "28107\t784\t662\t195\t2266.32",
        ];
        let counties = build(lines.iter().map(|s| s.to_string()), &[121, 195]);

        assert_eq!(counties.len(), 1);
        assert_eq!(counties[0].geoid, 28107);
        assert_eq!(counties[0].xs, vec![784]);
        assert_eq!(counties[0].ys, vec![662]);
        assert!((counties[0].weights[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn should_accumulate_duplicate_codes() {
        let function = WeightFunction::new(&[121]);
        let rows = vec![
            CoverRow { geoid: 1, x: 0, y: 0, code: 121, area: 1.5 },
            CoverRow { geoid: 1, x: 0, y: 0, code: 121, area: 2.5 },
        ];
        let pixels: Vec<_> = ApplyWeights::new(rows.into_iter(), &function).collect();
        assert_eq!(pixels.len(), 1);
        assert!((pixels[0].weight - 4.0).abs() < 1e-12);
    }

    #[test]
    fn should_keep_county_stream_order() {
        let counties = sample_counties(&[121]);
        assert_eq!(counties[0].geoid, 28107);
        assert_eq!(counties[1].geoid, 28108);
        assert!((counties[1].weights[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn should_handle_empty_stream() {
        let counties = build(std::iter::empty(), &[121]);
        assert!(counties.is_empty());
    }
}
