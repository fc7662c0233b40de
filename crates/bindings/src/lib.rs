#![allow(clippy::useless_conversion)]

use ndarray::{Array2, Array3};
use numpy::{
    PyArray1, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3, PyUntypedArrayMethods,
    ToPyArray,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use fst_core::geometry;
use fst_analysis::descriptors;
use fst_analysis::layout::FiberLayout;
use fst_analysis::ramp::{FrameTemperatureMap, RampSchedule};
use fst_analysis::sweep::{self, FrameSeries};
use fst_analysis::AnalysisError;

// ============================================================================
// Helpers: numpy <-> Vec<[f64;3]>
// ============================================================================

fn array3_to_trajectory(arr: &ndarray::ArrayView3<f64>) -> Vec<Vec<[f64; 3]>> {
    let n_frames = arr.shape()[0];
    let n_atoms = arr.shape()[1];
    let mut traj = Vec::with_capacity(n_frames);
    for i in 0..n_frames {
        let mut frame = Vec::with_capacity(n_atoms);
        for j in 0..n_atoms {
            frame.push([arr[[i, j, 0]], arr[[i, j, 1]], arr[[i, j, 2]]]);
        }
        traj.push(frame);
    }
    traj
}

fn trajectory_to_array3(traj: &[Vec<[f64; 3]>]) -> Array3<f64> {
    let n_frames = traj.len();
    let n_atoms = if n_frames > 0 { traj[0].len() } else { 0 };
    let mut result = Array3::<f64>::zeros((n_frames, n_atoms, 3));
    for (i, frame) in traj.iter().enumerate() {
        for (j, atom) in frame.iter().enumerate() {
            result[[i, j, 0]] = atom[0];
            result[[i, j, 1]] = atom[1];
            result[[i, j, 2]] = atom[2];
        }
    }
    result
}

fn array2_to_coords(arr: &ndarray::ArrayView2<f64>) -> Vec<[f64; 3]> {
    let n = arr.shape()[0];
    (0..n)
        .map(|i| [arr[[i, 0]], arr[[i, 1]], arr[[i, 2]]])
        .collect()
}

fn array1_to_point(arr: &PyReadonlyArray1<f64>) -> PyResult<[f64; 3]> {
    let view = arr.as_array();
    if view.len() != 3 {
        return Err(PyValueError::new_err(format!(
            "expected a 3-component point, got {} components",
            view.len()
        )));
    }
    Ok([view[0], view[1], view[2]])
}

fn check_xyz_columns(shape: &[usize], what: &str) -> PyResult<()> {
    if shape.last() != Some(&3) {
        return Err(PyValueError::new_err(format!(
            "{} must have a trailing dimension of 3, got shape {:?}",
            what, shape
        )));
    }
    Ok(())
}

fn rows_to_array2(rows: &[Vec<f64>]) -> Array2<f64> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, |r| r.len());
    let mut result = Array2::<f64>::zeros((n_rows, n_cols));
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            result[[i, j]] = v;
        }
    }
    result
}

fn to_py_err(e: AnalysisError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn layout_or_default(layout: Option<PyRef<'_, PyFiberLayout>>) -> FiberLayout {
    layout.map(|l| l.inner.clone()).unwrap_or_default()
}

fn frames_or_default(frame_temperatures: Option<Vec<(usize, f64)>>) -> FrameTemperatureMap {
    frame_temperatures
        .map(FrameTemperatureMap::new)
        .unwrap_or_default()
}

/// Pack a sweep into `{"frames", "temperatures", "values"}` with `values`
/// shaped (n_frames, n_interfaces).
fn series_to_dict<'py>(py: Python<'py>, series: &[FrameSeries]) -> PyResult<Bound<'py, PyDict>> {
    let frames: Vec<i64> = series.iter().map(|s| s.frame as i64).collect();
    let temps: Vec<f64> = series.iter().map(|s| s.temperature_c).collect();
    let rows: Vec<Vec<f64>> = series.iter().map(|s| s.values.clone()).collect();

    let result = PyDict::new_bound(py);
    result.set_item("frames", PyArray1::from_vec_bound(py, frames))?;
    result.set_item("temperatures", PyArray1::from_vec_bound(py, temps))?;
    result.set_item("values", rows_to_array2(&rows).to_pyarray_bound(py))?;
    Ok(result)
}

// ============================================================================
// GEOMETRY KERNEL
// ============================================================================

#[pyfunction]
#[pyo3(name = "dihedral")]
fn dihedral_py(
    p0: PyReadonlyArray1<f64>,
    p1: PyReadonlyArray1<f64>,
    p2: PyReadonlyArray1<f64>,
    p3: PyReadonlyArray1<f64>,
) -> PyResult<f64> {
    Ok(geometry::dihedral(
        &array1_to_point(&p0)?,
        &array1_to_point(&p1)?,
        &array1_to_point(&p2)?,
        &array1_to_point(&p3)?,
    ))
}

#[pyfunction]
#[pyo3(name = "wrap_angle")]
fn wrap_angle_py(angle_deg: f64) -> f64 {
    geometry::wrap_angle(angle_deg)
}

#[pyfunction]
#[pyo3(name = "first_principal_axis")]
fn first_principal_axis_py<'py>(
    py: Python<'py>,
    points: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    check_xyz_columns(points.shape(), "points")?;
    let coords = array2_to_coords(&points.as_array());
    let axis = geometry::first_principal_axis(&coords)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(PyArray1::from_vec_bound(py, axis.to_vec()))
}

#[pyfunction]
#[pyo3(name = "reconstruction_residuals")]
fn reconstruction_residuals_py<'py>(
    py: Python<'py>,
    points: PyReadonlyArray2<'py, f64>,
    axis: PyReadonlyArray1<'py, f64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    check_xyz_columns(points.shape(), "points")?;
    let coords = array2_to_coords(&points.as_array());
    let axis = array1_to_point(&axis)?;
    Ok(PyArray1::from_vec_bound(
        py,
        geometry::reconstruction_residuals(&coords, &axis),
    ))
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[pyclass(name = "FiberLayout")]
#[derive(Clone)]
struct PyFiberLayout {
    inner: FiberLayout,
}

#[pymethods]
impl PyFiberLayout {
    #[new]
    #[pyo3(signature = (monomer_atom_count=None, monomer_count=None, torsion_atoms=None, anchor_atom=None, segment_torsion=None))]
    fn new(
        monomer_atom_count: Option<usize>,
        monomer_count: Option<usize>,
        torsion_atoms: Option<[usize; 4]>,
        anchor_atom: Option<usize>,
        segment_torsion: Option<[usize; 4]>,
    ) -> PyResult<Self> {
        let mut layout = FiberLayout::default();
        if let Some(v) = monomer_atom_count {
            layout.monomer_atom_count = v;
        }
        if let Some(v) = monomer_count {
            layout.monomer_count = v;
        }
        if let Some(v) = torsion_atoms {
            layout.torsion_atoms = v;
        }
        if let Some(v) = anchor_atom {
            layout.anchor_atom = v;
        }
        if let Some(v) = segment_torsion {
            layout.segment_torsion = v;
        }
        layout.validate().map_err(to_py_err)?;
        Ok(PyFiberLayout { inner: layout })
    }

    #[getter]
    fn monomer_atom_count(&self) -> usize {
        self.inner.monomer_atom_count
    }
    #[getter]
    fn monomer_count(&self) -> usize {
        self.inner.monomer_count
    }
    #[getter]
    fn torsion_atoms(&self) -> [usize; 4] {
        self.inner.torsion_atoms
    }
    #[getter]
    fn anchor_atom(&self) -> usize {
        self.inner.anchor_atom
    }
    #[getter]
    fn segment_torsion(&self) -> [usize; 4] {
        self.inner.segment_torsion
    }

    fn fiber_atom_count(&self) -> usize {
        self.inner.fiber_atom_count()
    }

    fn interface_count(&self) -> usize {
        self.inner.interface_count()
    }

    fn interface_quadruple(&self, i: usize) -> PyResult<[usize; 4]> {
        if i >= self.inner.interface_count() {
            return Err(PyValueError::new_err(format!(
                "interface {} out of range (0-{})",
                i,
                self.inner.interface_count() - 1
            )));
        }
        Ok(self.inner.interface_quadruple(i))
    }

    fn anchor_indices(&self) -> Vec<usize> {
        self.inner.anchor_indices()
    }

    fn __repr__(&self) -> String {
        format!(
            "FiberLayout(monomer_atom_count={}, monomer_count={}, torsion_atoms={:?}, anchor_atom={}, segment_torsion={:?})",
            self.inner.monomer_atom_count,
            self.inner.monomer_count,
            self.inner.torsion_atoms,
            self.inner.anchor_atom,
            self.inner.segment_torsion,
        )
    }
}

#[pyclass(name = "RampSchedule")]
#[derive(Clone)]
struct PyRampSchedule {
    inner: RampSchedule,
}

#[pymethods]
impl PyRampSchedule {
    #[new]
    #[pyo3(signature = (start_temperature_k=None, end_temperature_k=None, n_steps=None, block_size=None, report_interval=None))]
    fn new(
        start_temperature_k: Option<f64>,
        end_temperature_k: Option<f64>,
        n_steps: Option<usize>,
        block_size: Option<usize>,
        report_interval: Option<usize>,
    ) -> PyResult<Self> {
        let mut ramp = RampSchedule::default();
        if let Some(v) = start_temperature_k {
            ramp.start_temperature_k = v;
        }
        if let Some(v) = end_temperature_k {
            ramp.end_temperature_k = v;
        }
        if let Some(v) = n_steps {
            ramp.n_steps = v;
        }
        if let Some(v) = block_size {
            ramp.block_size = v;
        }
        if let Some(v) = report_interval {
            ramp.report_interval = v;
        }
        ramp.validate().map_err(to_py_err)?;
        Ok(PyRampSchedule { inner: ramp })
    }

    #[getter]
    fn n_frames(&self) -> usize {
        self.inner.n_frames()
    }
    #[getter]
    fn n_blocks(&self) -> usize {
        self.inner.n_blocks()
    }

    fn temperature_at_frame_k(&self, frame: usize) -> f64 {
        self.inner.temperature_at_frame_k(frame)
    }

    fn temperature_at_frame_c(&self, frame: usize) -> f64 {
        self.inner.temperature_at_frame_c(frame)
    }

    fn frame_for_temperature_c(&self, temperature_c: f64) -> Option<usize> {
        self.inner.frame_for_temperature_c(temperature_c)
    }

    /// `[(frame, temperature_c)]` for the given frames, ready to pass as
    /// `frame_temperatures` to the sweeps.
    fn frame_temperatures(&self, frames: Vec<usize>) -> Vec<(usize, f64)> {
        FrameTemperatureMap::from_schedule(&self.inner, &frames)
            .entries()
            .to_vec()
    }
}

#[pyfunction]
#[pyo3(name = "default_frame_temperatures")]
fn default_frame_temperatures_py() -> Vec<(usize, f64)> {
    FrameTemperatureMap::default().entries().to_vec()
}

// ============================================================================
// PER-FRAME DESCRIPTORS
// ============================================================================

#[pyfunction]
#[pyo3(name = "interface_torsions", signature = (frame, layout=None))]
fn interface_torsions_py<'py>(
    py: Python<'py>,
    frame: PyReadonlyArray2<'py, f64>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    check_xyz_columns(frame.shape(), "frame")?;
    let coords = array2_to_coords(&frame.as_array());
    let layout = layout_or_default(layout);
    let torsions = descriptors::interface_torsions(&coords, &layout).map_err(to_py_err)?;
    Ok(PyArray1::from_vec_bound(py, torsions))
}

#[pyfunction]
#[pyo3(name = "segment_torsion", signature = (frame, layout=None))]
fn segment_torsion_py(
    frame: PyReadonlyArray2<'_, f64>,
    layout: Option<PyRef<'_, PyFiberLayout>>,
) -> PyResult<f64> {
    check_xyz_columns(frame.shape(), "frame")?;
    let coords = array2_to_coords(&frame.as_array());
    let layout = layout_or_default(layout);
    descriptors::segment_torsion(&coords, &layout).map_err(to_py_err)
}

#[pyfunction]
#[pyo3(name = "stacking_geometry", signature = (frame, layout=None))]
fn stacking_geometry_py<'py>(
    py: Python<'py>,
    frame: PyReadonlyArray2<'py, f64>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyDict>> {
    check_xyz_columns(frame.shape(), "frame")?;
    let coords = array2_to_coords(&frame.as_array());
    let layout = layout_or_default(layout);
    let geom = descriptors::stacking_geometry(&coords, &layout).map_err(to_py_err)?;

    let result = PyDict::new_bound(py);
    result.set_item("axis", PyArray1::from_vec_bound(py, geom.axis.to_vec()))?;
    result.set_item(
        "stacking_distances",
        PyArray1::from_vec_bound(py, geom.stacking_distances),
    )?;
    result.set_item(
        "lateral_shifts",
        PyArray1::from_vec_bound(py, geom.lateral_shifts),
    )?;
    Ok(result)
}

#[pyfunction]
#[pyo3(name = "slice_fiber", signature = (trajectory, layout=None))]
fn slice_fiber_py<'py>(
    py: Python<'py>,
    trajectory: PyReadonlyArray3<'py, f64>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, numpy::PyArray3<f64>>> {
    check_xyz_columns(trajectory.shape(), "trajectory")?;
    let traj = array3_to_trajectory(&trajectory.as_array());
    let layout = layout_or_default(layout);
    let sliced = traj
        .iter()
        .map(|frame| layout.slice_fiber(frame))
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_py_err)?;
    Ok(trajectory_to_array3(&sliced).to_pyarray_bound(py))
}

// ============================================================================
// SWEEPS
// ============================================================================

#[pyfunction]
#[pyo3(name = "torsion_sweep", signature = (trajectory, frame_temperatures=None, layout=None))]
fn torsion_sweep_py<'py>(
    py: Python<'py>,
    trajectory: PyReadonlyArray3<'py, f64>,
    frame_temperatures: Option<Vec<(usize, f64)>>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyDict>> {
    check_xyz_columns(trajectory.shape(), "trajectory")?;
    let traj = array3_to_trajectory(&trajectory.as_array());
    let frames = frames_or_default(frame_temperatures);
    let layout = layout_or_default(layout);

    let series = py
        .allow_threads(|| sweep::torsion_sweep(&traj, &frames, &layout))
        .map_err(to_py_err)?;
    series_to_dict(py, &series)
}

#[pyfunction]
#[pyo3(name = "segment_torsion_sweep", signature = (trajectory, frame_temperatures=None, layout=None))]
fn segment_torsion_sweep_py<'py>(
    py: Python<'py>,
    trajectory: PyReadonlyArray3<'py, f64>,
    frame_temperatures: Option<Vec<(usize, f64)>>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyDict>> {
    check_xyz_columns(trajectory.shape(), "trajectory")?;
    let traj = array3_to_trajectory(&trajectory.as_array());
    let frames = frames_or_default(frame_temperatures);
    let layout = layout_or_default(layout);

    let values = py
        .allow_threads(|| sweep::segment_torsion_sweep(&traj, &frames, &layout))
        .map_err(to_py_err)?;

    let result = PyDict::new_bound(py);
    result.set_item(
        "frames",
        PyArray1::from_vec_bound(py, values.iter().map(|v| v.frame as i64).collect()),
    )?;
    result.set_item(
        "temperatures",
        PyArray1::from_vec_bound(py, values.iter().map(|v| v.temperature_c).collect()),
    )?;
    result.set_item(
        "values",
        PyArray1::from_vec_bound(py, values.iter().map(|v| v.value).collect()),
    )?;
    Ok(result)
}

#[pyfunction]
#[pyo3(name = "stacking_sweep", signature = (trajectory, frame_temperatures=None, layout=None))]
fn stacking_sweep_py<'py>(
    py: Python<'py>,
    trajectory: PyReadonlyArray3<'py, f64>,
    frame_temperatures: Option<Vec<(usize, f64)>>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyDict>> {
    check_xyz_columns(trajectory.shape(), "trajectory")?;
    let traj = array3_to_trajectory(&trajectory.as_array());
    let frames = frames_or_default(frame_temperatures);
    let layout = layout_or_default(layout);

    let series = py
        .allow_threads(|| sweep::stacking_sweep(&traj, &frames, &layout))
        .map_err(to_py_err)?;
    series_to_dict(py, &series)
}

#[pyfunction]
#[pyo3(name = "lateral_shift_sweep", signature = (trajectory, frame_temperatures=None, layout=None))]
fn lateral_shift_sweep_py<'py>(
    py: Python<'py>,
    trajectory: PyReadonlyArray3<'py, f64>,
    frame_temperatures: Option<Vec<(usize, f64)>>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyDict>> {
    check_xyz_columns(trajectory.shape(), "trajectory")?;
    let traj = array3_to_trajectory(&trajectory.as_array());
    let frames = frames_or_default(frame_temperatures);
    let layout = layout_or_default(layout);

    let series = py
        .allow_threads(|| sweep::lateral_shift_sweep(&traj, &frames, &layout))
        .map_err(to_py_err)?;
    series_to_dict(py, &series)
}

#[pyfunction]
#[pyo3(name = "torsion_heatmap", signature = (trajectory, frame_temperatures=None, layout=None))]
fn torsion_heatmap_py<'py>(
    py: Python<'py>,
    trajectory: PyReadonlyArray3<'py, f64>,
    frame_temperatures: Option<Vec<(usize, f64)>>,
    layout: Option<PyRef<'py, PyFiberLayout>>,
) -> PyResult<Bound<'py, PyDict>> {
    check_xyz_columns(trajectory.shape(), "trajectory")?;
    let traj = array3_to_trajectory(&trajectory.as_array());
    let frames = frames_or_default(frame_temperatures);
    let layout = layout_or_default(layout);

    let heatmap = py
        .allow_threads(|| sweep::torsion_heatmap(&traj, &frames, &layout))
        .map_err(to_py_err)?;

    let frame_idx: Vec<i64> = heatmap.frames.iter().map(|&f| f as i64).collect();
    let result = PyDict::new_bound(py);
    result.set_item("frames", PyArray1::from_vec_bound(py, frame_idx))?;
    result.set_item(
        "temperatures",
        PyArray1::from_vec_bound(py, heatmap.temperatures_c.clone()),
    )?;
    result.set_item("values", rows_to_array2(&heatmap.rows).to_pyarray_bound(py))?;
    Ok(result)
}

// ============================================================================
// MODULE DEFINITION
// ============================================================================

#[pymodule]
fn fiber_simulation_tools(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Geometry kernel
    m.add_function(wrap_pyfunction!(dihedral_py, m)?)?;
    m.add_function(wrap_pyfunction!(wrap_angle_py, m)?)?;
    m.add_function(wrap_pyfunction!(first_principal_axis_py, m)?)?;
    m.add_function(wrap_pyfunction!(reconstruction_residuals_py, m)?)?;

    // Configuration
    m.add_class::<PyFiberLayout>()?;
    m.add_class::<PyRampSchedule>()?;
    m.add_function(wrap_pyfunction!(default_frame_temperatures_py, m)?)?;

    // Per-frame descriptors
    m.add_function(wrap_pyfunction!(interface_torsions_py, m)?)?;
    m.add_function(wrap_pyfunction!(segment_torsion_py, m)?)?;
    m.add_function(wrap_pyfunction!(stacking_geometry_py, m)?)?;
    m.add_function(wrap_pyfunction!(slice_fiber_py, m)?)?;

    // Sweeps
    m.add_function(wrap_pyfunction!(torsion_sweep_py, m)?)?;
    m.add_function(wrap_pyfunction!(segment_torsion_sweep_py, m)?)?;
    m.add_function(wrap_pyfunction!(stacking_sweep_py, m)?)?;
    m.add_function(wrap_pyfunction!(lateral_shift_sweep_py, m)?)?;
    m.add_function(wrap_pyfunction!(torsion_heatmap_py, m)?)?;

    Ok(())
}
