//! Scalar fields of the currently loaded case.

use crate::mesh::Mesh;
use crate::mesh::Triangle;
use crate::Error;
use crate::Result;
use adb_io::CaseData;
use adb_io::Field;
use itertools::Itertools as _;
use itertools::MinMaxResult;
use std::fmt;
use std::io;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Pressure coefficient.
    Cp,
    CpSteady,
    CpUnsteady,
    /// Circulation.
    Gamma,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Cp,
        FieldKind::CpSteady,
        FieldKind::CpUnsteady,
        FieldKind::Gamma,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn to_field(self) -> Field {
        match self {
            FieldKind::Cp => Field::Cp,
            FieldKind::CpSteady => Field::CpSteady,
            FieldKind::CpUnsteady => Field::CpUnsteady,
            FieldKind::Gamma => Field::Gamma,
        }
    }
}

impl From<Field> for FieldKind {
    fn from(field: Field) -> Self {
        match field {
            Field::Cp => FieldKind::Cp,
            Field::CpSteady => FieldKind::CpSteady,
            Field::CpUnsteady => FieldKind::CpUnsteady,
            Field::Gamma => FieldKind::Gamma,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Cp => "Cp",
            FieldKind::CpSteady => "Cp (steady)",
            FieldKind::CpUnsteady => "Cp (unsteady)",
            FieldKind::Gamma => "Gamma",
        })
    }
}

/// Closed interval of scalar values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range of the finite values of `values`, `None` if there is none.
    pub fn of<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        match values.into_iter().filter(|v| v.is_finite()).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some(Range::new(v, v)),
            MinMaxResult::MinMax(min, max) => Some(Range::new(min, max)),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Which per-element array feeds the colors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    /// One color per triangle.
    #[default]
    Flat,
    /// One color per node, interpolated across triangles.
    Smooth,
}

/// Area-weighted average of per-triangle values around each node.
///
/// Non-finite values are skipped. If every incident triangle has a zero area,
/// the plain mean is used instead. Isolated nodes get zero.
pub fn nodal_average(triangles: &[Triangle], values: &[f64], node_count: usize) -> Vec<f64> {
    let mut weighted = vec![(0.0, 0.0); node_count];
    let mut plain = vec![(0.0, 0usize); node_count];
    for (triangle, value) in triangles.iter().zip(values) {
        if !value.is_finite() {
            continue;
        }
        for n in triangle.nodes {
            weighted[n].0 += triangle.area * value;
            weighted[n].1 += triangle.area;
            plain[n].0 += value;
            plain[n].1 += 1;
        }
    }
    weighted
        .into_iter()
        .zip(plain)
        .map(|((sum, area), (plain_sum, count))| {
            if 0.0 < area {
                sum / area
            } else if 0 < count {
                plain_sum / count as f64
            } else {
                0.0
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    kind: FieldKind,
    per_triangle: Vec<f64>,
    per_node: Vec<f64>,
    actual: Range,
}

impl ScalarField {
    pub fn new(kind: FieldKind, per_triangle: Vec<f64>, mesh: &Mesh) -> Self {
        let per_node = nodal_average(mesh.triangles(), &per_triangle, mesh.node_count());
        let actual = Range::of(per_triangle.iter().copied()).unwrap_or_default();
        Self {
            kind,
            per_triangle,
            per_node,
            actual,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn per_triangle(&self) -> &[f64] {
        &self.per_triangle
    }

    pub fn per_node(&self) -> &[f64] {
        &self.per_node
    }

    pub fn values(&self, shading: Shading) -> &[f64] {
        match shading {
            Shading::Flat => &self.per_triangle,
            Shading::Smooth => &self.per_node,
        }
    }

    /// Range of the data.
    pub fn actual(&self) -> Range {
        self.actual
    }
}

/// What the renderer needs from a field.
#[derive(Copy, Clone, Debug)]
pub struct FieldView<'a> {
    pub kind: FieldKind,
    pub shading: Shading,
    /// Per triangle or per node, depending on `shading`.
    pub values: &'a [f64],
    pub actual: Range,
    /// Legend range: the user override if any, `actual` otherwise.
    pub displayed: Range,
}

/// Resident scalar fields, replaced as a whole on each case load.
#[derive(Clone, Debug, Default)]
pub struct SolutionStore {
    case: Option<usize>,
    fields: [Option<ScalarField>; 4],
    overrides: [Option<Range>; 4],
}

impl SolutionStore {
    /// Reads the given case and makes its fields resident.
    pub fn load_case<R>(
        &mut self,
        index: usize,
        reader: &mut adb_io::Reader<R>,
        mesh: &Mesh,
    ) -> Result<()>
    where
        R: io::Read + io::Seek,
    {
        let count = reader.case_count();
        if count <= index {
            return Err(Error::CaseIndexOutOfRange { index, count });
        }
        let data = reader.read_case(index)?;
        self.replace(index, data, mesh)
    }

    /// Drops every resident field and installs the ones of `data`.
    ///
    /// Every field must hold one value per triangle of `mesh`, otherwise
    /// nothing changes.
    pub fn replace(&mut self, case: usize, mut data: CaseData, mesh: &Mesh) -> Result<()> {
        let span = tracing::info_span!("load case", case);
        let _enter = span.enter();

        let expected = mesh.triangle_count();
        for kind in FieldKind::ALL {
            let found = data.field(kind.to_field()).map_or(expected, <[f32]>::len);
            if found != expected {
                return Err(Error::FieldLength {
                    kind,
                    found,
                    expected,
                });
            }
        }

        let mut fields: [Option<ScalarField>; 4] = Default::default();
        for kind in FieldKind::ALL {
            let values = match data.take_field(kind.to_field()) {
                Some(v) => v,
                None => {
                    tracing::debug!(%kind, "field absent");
                    continue;
                }
            };
            let values: Vec<f64> = values.into_iter().map(f64::from).collect();
            let field = ScalarField::new(kind, values, mesh);
            tracing::debug!(%kind, min = field.actual.min, max = field.actual.max);
            fields[kind.index()] = Some(field);
        }

        self.fields = fields;
        self.case = Some(case);
        Ok(())
    }

    /// Forgets the resident case. Legend overrides are kept.
    pub fn clear(&mut self) {
        self.fields = Default::default();
        self.case = None;
    }

    pub fn case(&self) -> Option<usize> {
        self.case
    }

    pub fn is_available(&self, kind: FieldKind) -> bool {
        self.fields[kind.index()].is_some()
    }

    pub fn available(&self) -> impl Iterator<Item = FieldKind> + '_ {
        FieldKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
    }

    pub fn field(&self, kind: FieldKind) -> Result<&ScalarField> {
        self.fields[kind.index()]
            .as_ref()
            .ok_or(Error::EmptyScalarField(kind))
    }

    pub fn view(&self, kind: FieldKind, shading: Shading) -> Result<FieldView<'_>> {
        let field = self.field(kind)?;
        Ok(FieldView {
            kind,
            shading,
            values: field.values(shading),
            actual: field.actual,
            displayed: self.displayed_range(kind).unwrap_or(field.actual),
        })
    }

    /// The legend range of a field: the override if set, otherwise the data
    /// range of the resident field.
    pub fn displayed_range(&self, kind: FieldKind) -> Option<Range> {
        let resident = self.fields[kind.index()].as_ref().map(|f| f.actual);
        self.overrides[kind.index()].or(resident)
    }

    pub fn legend_override(&self, kind: FieldKind) -> Option<Range> {
        self.overrides[kind.index()]
    }

    /// Pins the legend range of a field across case loads.
    ///
    /// Reversed bounds are swapped; non-finite bounds are rejected.
    pub fn set_legend_range(&mut self, kind: FieldKind, min: f64, max: f64) -> Result<()> {
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidLegendRange { min, max });
        }
        let range = if max < min {
            Range::new(max, min)
        } else {
            Range::new(min, max)
        };
        self.overrides[kind.index()] = Some(range);
        Ok(())
    }

    /// Makes the legend follow the data again.
    pub fn reset_legend_range(&mut self, kind: FieldKind) {
        self.overrides[kind.index()] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshOptions;
    use crate::mesh::Node;
    use approx::assert_ulps_eq;
    use proptest::prelude::*;

    /// Three triangles fanned around node 0.
    fn fan() -> Mesh {
        let nodes = vec![
            Node::new(0.0, 0.0, 0.0, 1),
            Node::new(1.0, 0.0, 0.0, 1),
            Node::new(0.0, 1.0, 0.0, 1),
            Node::new(-2.0, 0.0, 0.0, 1),
            Node::new(0.0, -1.0, 0.0, 1),
        ];
        let triangles = vec![
            Triangle::new([0, 1, 2], 1, 5),
            Triangle::new([0, 2, 3], 1, 5),
            Triangle::new([0, 3, 4], 1, 5),
        ];
        Mesh::new(nodes, triangles, &MeshOptions::default()).unwrap()
    }

    fn case_data(cp: &[f32]) -> CaseData {
        let mut data = CaseData::default();
        data.set_field(Field::Cp, cp.to_vec());
        data
    }

    #[test]
    fn area_weighted_nodal_values() {
        let mesh = fan();
        // Areas are 0.5, 1.0 and 1.0.
        let field = ScalarField::new(FieldKind::Cp, vec![1.0, 2.0, 3.0], &mesh);
        let per_node = field.per_node();
        assert_ulps_eq!(per_node[0], (0.5 * 1.0 + 2.0 + 3.0) / 2.5);
        assert_ulps_eq!(per_node[1], 1.0);
        assert_ulps_eq!(per_node[2], (0.5 * 1.0 + 2.0) / 1.5);
        assert_ulps_eq!(per_node[3], 2.5);
        assert_ulps_eq!(per_node[4], 3.0);
        assert_eq!(field.values(Shading::Flat), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn legend_follows_data_until_overridden() {
        let mesh = fan();
        let mut store = SolutionStore::default();
        let data = case_data(&[1.0, 2.0, 3.0]);
        store.replace(0, data.clone(), &mesh).unwrap();

        let view = store.view(FieldKind::Cp, Shading::Flat).unwrap();
        assert_eq!(view.actual, Range::new(1.0, 3.0));
        assert_eq!(view.displayed, Range::new(1.0, 3.0));

        store.set_legend_range(FieldKind::Cp, 0.0, 10.0).unwrap();
        store.replace(0, data, &mesh).unwrap();
        let view = store.view(FieldKind::Cp, Shading::Flat).unwrap();
        assert_eq!(view.actual, Range::new(1.0, 3.0));
        assert_eq!(view.displayed, Range::new(0.0, 10.0));

        store.reset_legend_range(FieldKind::Cp);
        let view = store.view(FieldKind::Cp, Shading::Smooth).unwrap();
        assert_eq!(view.displayed, Range::new(1.0, 3.0));
        assert_eq!(view.values.len(), mesh.node_count());
    }

    #[test]
    fn legend_range_validation() {
        let mut store = SolutionStore::default();
        store.set_legend_range(FieldKind::Gamma, 4.0, -1.0).unwrap();
        assert_eq!(
            store.legend_override(FieldKind::Gamma),
            Some(Range::new(-1.0, 4.0))
        );
        assert!(matches!(
            store.set_legend_range(FieldKind::Gamma, f64::NAN, 1.0),
            Err(Error::InvalidLegendRange { .. })
        ));
        assert_eq!(
            store.legend_override(FieldKind::Gamma),
            Some(Range::new(-1.0, 4.0))
        );
    }

    #[test]
    fn short_payloads_are_rejected() {
        let mesh = fan();
        let mut store = SolutionStore::default();
        let data = case_data(&[1.0, 2.0, 3.0]);
        store.replace(0, data.clone(), &mesh).unwrap();

        let mut short = data;
        short.set_field(Field::Gamma, vec![0.1]);
        assert!(matches!(
            store.replace(1, short, &mesh),
            Err(Error::FieldLength {
                kind: FieldKind::Gamma,
                found: 1,
                expected: 3,
            })
        ));
        assert_eq!(store.case(), Some(0));
        assert!(!store.is_available(FieldKind::Gamma));
    }

    #[test]
    fn replace_is_not_cumulative() {
        let mesh = fan();
        let mut store = SolutionStore::default();

        let mut a = case_data(&[1.0, 2.0, 3.0]);
        a.set_field(Field::CpUnsteady, vec![0.5, 0.5, 0.5]);
        let b = case_data(&[-4.0, 0.0, 8.0]);

        store.replace(0, a.clone(), &mesh).unwrap();
        let first = store.field(FieldKind::Cp).unwrap().clone();

        store.replace(1, b, &mesh).unwrap();
        assert_eq!(store.case(), Some(1));
        assert!(matches!(
            store.field(FieldKind::CpUnsteady),
            Err(Error::EmptyScalarField(FieldKind::CpUnsteady))
        ));
        assert_eq!(
            store.field(FieldKind::Cp).unwrap().actual(),
            Range::new(-4.0, 8.0)
        );

        store.replace(0, a, &mesh).unwrap();
        assert_eq!(store.field(FieldKind::Cp).unwrap(), &first);
        assert_eq!(
            store.available().collect::<Vec<_>>(),
            [FieldKind::Cp, FieldKind::CpUnsteady]
        );
    }

    #[test]
    fn non_finite_values_are_ignored() {
        assert_eq!(
            Range::of([f64::NAN, 2.0, f64::INFINITY, -1.0]),
            Some(Range::new(-1.0, 2.0))
        );
        assert_eq!(Range::of([f64::NAN]), None);
    }

    proptest!(
        /// A nodal value stays within the values of its incident triangles.
        #[test]
        fn nodal_average_is_bounded(
            (positions, tris, values) in (3..12usize).prop_flat_map(|node_count| {
                (
                    prop::collection::vec(prop::array::uniform3(-10.0..10.0f64), node_count),
                    prop::collection::vec(prop::array::uniform3(0..node_count), 1..24),
                )
            }).prop_flat_map(|(positions, tris)| {
                let len = tris.len();
                (Just(positions), Just(tris), prop::collection::vec(-100.0..100.0f64, len))
            })
        ) {
            let nodes: Vec<Node> = positions
                .iter()
                .map(|[x, y, z]| Node::new(*x, *y, *z, 1))
                .collect();
            let triangles: Vec<Triangle> = tris.iter().map(|t| Triangle::new(*t, 1, 5)).collect();
            let mesh = Mesh::new(nodes, triangles, &MeshOptions::default()).unwrap();
            let per_node = nodal_average(mesh.triangles(), &values, mesh.node_count());

            for (n, value) in per_node.iter().enumerate() {
                let incident = Range::of(
                    mesh.triangles()
                        .iter()
                        .zip(&values)
                        .filter(|(t, _)| t.nodes.contains(&n))
                        .map(|(_, v)| *v),
                );
                if let Some(range) = incident {
                    let slack = 1e-9 * (1.0 + range.min.abs().max(range.max.abs()));
                    prop_assert!(range.min - slack <= *value && *value <= range.max + slack);
                }
            }
        }
    );
}
