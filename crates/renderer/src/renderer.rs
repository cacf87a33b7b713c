//! The scene renderer.
//!
//! A scene goes through these stages, in order, and any failure abandons it:
//!
//! - Loaded: the target and the matching stretch of the interferer are read.
//! - Padded: silence is added around the target.
//! - Ramped: the interferer is faded in and out.
//! - PerChannelRendered: once per configured channel, both sources go through that channel's room impulse responses,
//!   the interferer is scaled, and the two are mixed.
//! - AnechoicBuilt: the dry reference is made.
//! - Written: everything is saved.
//!
//! The interferer scaling is the subtle part.  The first channel rendered (channel 1, or nothing if there are no
//! channels) is measured to find the gain that levels the interferer with the target.  That one gain is then used for
//! every channel of the scene, so that the level differences between hearing aid microphones survive.  Measuring each
//! channel separately would flatten them.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use scene_dsp::{
    apply_ramp, pad, sum_signals, BetterEarSnr, ChannelFormat, DbExt, Signal, SnrMetric,
    SpeechWeighting,
};

use crate::brir::BrirConvolver;
use crate::completeness::scene_is_rendered;
use crate::config::{ConfigError, RendererConfig};
use crate::error::Result;
use crate::naming::{ArtifactRole, BrirRole, InputLayout};
use crate::reference_snr::ReferenceSnrEstimator;
use crate::scene::SceneDescriptor;
use crate::signal_io::{EncodedSignal, SignalIoError, WavIo};

/// Where a scene is in the pipeline.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RenderStage {
    Loaded,
    Padded,
    Ramped,
    /// How many channels have been rendered so far.
    PerChannelRendered(usize),
    AnechoicBuilt,
    Written,
}

/// One output signal and what it is.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub role: ArtifactRole,
    pub signal: Signal,
}

/// Everything one render produced, in the order it was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedScene {
    pub scene_id: String,
    pub artifacts: Vec<Artifact>,

    /// The gain derived from the reference channel, if any channels were rendered.
    pub reference_gain: Option<f64>,
}

impl RenderedScene {
    pub fn get(&self, role: ArtifactRole) -> Option<&Signal> {
        self.artifacts
            .iter()
            .find(|a| a.role == role)
            .map(|a| &a.signal)
    }

    pub fn file_names(&self) -> impl Iterator<Item = String> + '_ {
        self.artifacts
            .iter()
            .map(|a| a.role.file_name(&self.scene_id))
    }
}

/// State for one scene, dropped when the scene is done.
struct SceneContext<'a> {
    scene: &'a SceneDescriptor,
    stage: Option<RenderStage>,

    /// Set by the first channel, read by the rest.
    reference_gain: OnceCell<f64>,

    /// Length of the reference channel's target impulse response, which the anechoic response is padded to.
    reference_brir_len: Option<usize>,

    convolver: BrirConvolver,
    artifacts: Vec<Artifact>,
}

impl<'a> SceneContext<'a> {
    fn new(scene: &'a SceneDescriptor, n_tail: usize) -> Self {
        SceneContext {
            scene,
            stage: None,
            reference_gain: OnceCell::new(),
            reference_brir_len: None,
            convolver: BrirConvolver::new(n_tail),
            artifacts: vec![],
        }
    }

    fn advance(&mut self, next: RenderStage) {
        debug_assert!(
            self.stage.map_or(true, |s| s < next),
            "Scene {} went from {:?} to {:?}",
            self.scene.scene,
            self.stage,
            next
        );
        log::trace!("Scene {}: {:?}", self.scene.scene, next);
        self.stage = Some(next);
    }

    fn record(&mut self, role: ArtifactRole, signal: Signal) {
        self.artifacts.push(Artifact { role, signal });
    }

    fn into_rendered(self) -> RenderedScene {
        RenderedScene {
            scene_id: self.scene.scene.clone(),
            reference_gain: self.reference_gain.get().copied(),
            artifacts: self.artifacts,
        }
    }
}

/// Renders scenes from one input tree into one output directory.
///
/// A renderer holds no per-scene state and can be shared between threads rendering different scenes.
#[derive(Debug)]
pub struct Renderer {
    config: RendererConfig,
    inputs: InputLayout,
    output_dir: PathBuf,
    io: WavIo,
    estimator: ReferenceSnrEstimator,
}

fn load_speech_weighting(io: &WavIo, path: &Path) -> Result<SpeechWeighting> {
    let filter = io.read(path, 0, None, Some(ChannelFormat::Mono))?;
    let weighting = SpeechWeighting::from_taps(filter.channel(0)).ok_or_else(|| {
        ConfigError::Invalid(format!("speech filter {} is empty", path.display()))
    })?;
    log::info!(
        "Loaded a {}-tap speech weighting filter from {}",
        weighting.taps().len(),
        path.display()
    );
    Ok(weighting)
}

impl Renderer {
    pub fn new(
        config: RendererConfig,
        input_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Renderer> {
        config.validate()?;
        let io = WavIo::new(config.sample_rate);

        let weighting = match config.speech_filter.as_deref() {
            Some(path) => load_speech_weighting(&io, path)?,
            None => SpeechWeighting::flat(),
        };

        let estimator = ReferenceSnrEstimator::new(
            Arc::new(BetterEarSnr::new(weighting)),
            config.pre_samples(),
            config.post_samples(),
        );

        Ok(Renderer {
            inputs: InputLayout::new(input_root),
            output_dir: output_dir.into(),
            io,
            estimator,
            config,
        })
    }

    /// Replace the metric used to derive the reference gain.
    pub fn with_metric(mut self, metric: Arc<dyn SnrMetric + Send + Sync>) -> Renderer {
        self.estimator = ReferenceSnrEstimator::new(
            metric,
            self.config.pre_samples(),
            self.config.post_samples(),
        );
        self
    }

    /// Have all of this scene's outputs already been written?
    pub fn is_rendered(&self, scene: &SceneDescriptor) -> bool {
        scene_is_rendered(&scene.scene, &self.output_dir, self.config.num_channels)
    }

    /// Render a scene and write it out.
    pub fn render(&self, scene: &SceneDescriptor) -> Result<RenderedScene> {
        let mut ctx = self.build(scene)?;
        self.write(&mut ctx)?;
        Ok(ctx.into_rendered())
    }

    /// Render a scene without writing anything.
    pub fn render_signals(&self, scene: &SceneDescriptor) -> Result<RenderedScene> {
        Ok(self.build(scene)?.into_rendered())
    }

    /// Take a scene from nothing to [RenderStage::AnechoicBuilt].
    fn build<'a>(&self, scene: &'a SceneDescriptor) -> Result<SceneContext<'a>> {
        let mut ctx = SceneContext::new(scene, self.config.n_tail());
        let pre = self.config.pre_samples();
        let post = self.config.post_samples();

        let target = self
            .io
            .read(self.inputs.target(&scene.dataset, &scene.target.name), 0, None, None)?;
        let padded_len = target.len() + pre + post;
        let interferer = self.io.read(
            self.inputs.interferer(
                &scene.dataset,
                &scene.interferer.kind,
                &scene.interferer.name,
            ),
            scene.interferer.offset,
            Some(padded_len),
            None,
        )?;
        ctx.advance(RenderStage::Loaded);

        let target = target.zero_padded(pre, post);
        if target.len() != interferer.len() {
            log::debug!(
                "Scene {}: target ({}) and interferer ({}) have different lengths",
                scene.scene,
                target.len(),
                interferer.len()
            );
        }
        ctx.advance(RenderStage::Padded);

        let interferer = apply_ramp(
            &interferer,
            self.config.ramp_duration,
            self.config.sample_rate,
        );
        ctx.advance(RenderStage::Ramped);

        ctx.record(ArtifactRole::Target, target.clone());
        ctx.record(ArtifactRole::Interferer, interferer.clone());

        for (index, channel) in self.config.channels().into_iter().enumerate() {
            self.render_channel(&mut ctx, channel, &target, &interferer)?;
            ctx.advance(RenderStage::PerChannelRendered(index + 1));
        }

        let anechoic = self.render_anechoic(&mut ctx, &target)?;
        ctx.record(ArtifactRole::TargetAnechoic, anechoic);
        ctx.advance(RenderStage::AnechoicBuilt);

        Ok(ctx)
    }

    fn read_brir(&self, scene: &SceneDescriptor, role: BrirRole, channel: usize) -> Result<Signal> {
        let path = self
            .inputs
            .brir(&scene.dataset, &scene.room.name, role, channel);
        Ok(self.io.read(path, 0, None, None)?)
    }

    fn render_channel(
        &self,
        ctx: &mut SceneContext<'_>,
        channel: usize,
        target: &Signal,
        interferer: &Signal,
    ) -> Result<()> {
        let scene = ctx.scene;
        let target_brir = self.read_brir(scene, BrirRole::Target, channel)?;
        let interferer_brir = self.read_brir(scene, BrirRole::Interferer, channel)?;

        let target_at_ear = ctx.convolver.apply_brir(target, &target_brir)?;
        let interferer_at_ear = ctx.convolver.apply_brir(interferer, &interferer_brir)?;

        log::info!(
            "Scene {}: scaling interferer to obtain mixture SNR = {} dB",
            scene.scene,
            scene.snr_db
        );

        let gain = *ctx.reference_gain.get_or_try_init(|| {
            log::debug!("Scene {}: using channel {} as reference", scene.scene, channel);
            self.estimator.estimate(&target_at_ear, &interferer_at_ear)
        })?;
        if ctx.reference_brir_len.is_none() {
            ctx.reference_brir_len = Some(target_brir.len());
        }

        // First level the interferer with the target, then back it off to the requested SNR.
        let level = (-scene.snr_db).db_to_gain();
        let interferer_at_ear = interferer_at_ear.map(|x| x * gain * level);

        let mixed = sum_signals(&[&target_at_ear, &interferer_at_ear])?;

        let [mixed_role, target_role, interferer_role] = ArtifactRole::per_channel(channel);
        ctx.record(mixed_role, mixed);
        ctx.record(target_role, target_at_ear);
        ctx.record(interferer_role, interferer_at_ear);
        Ok(())
    }

    /// The target through the anechoic impulse response, padded so it lines up in time with the room renders.
    fn render_anechoic(&self, ctx: &mut SceneContext<'_>, target: &Signal) -> Result<Signal> {
        let scene = ctx.scene;

        let reference_len = match ctx.reference_brir_len {
            Some(len) => len,
            // Without any channels, the eardrum response is loaded just for its length.
            None => self.read_brir(scene, BrirRole::Target, 0)?.len(),
        };

        let anechoic_brir = self.io.read(
            self.inputs.anechoic_brir(&scene.dataset, &scene.room.name),
            0,
            None,
            None,
        )?;
        let anechoic_brir = pad(&anechoic_brir, reference_len)?;

        Ok(ctx.convolver.apply_brir(target, &anechoic_brir)?)
    }

    /// Write every artifact of a scene to the output directory.
    ///
    /// All artifacts are encoded before any file is touched.  If one of them clips, whatever a previous render left
    /// behind is untouched, so the completeness check never sees outputs from two different renders.
    fn write(&self, ctx: &mut SceneContext<'_>) -> Result<()> {
        let scene = ctx.scene;
        let scene_id = &scene.scene;
        let encoding = self.config.output_encoding;

        let encoded = ctx
            .artifacts
            .iter()
            .map(|artifact| {
                let path = self.output_dir.join(artifact.role.file_name(scene_id));
                let samples = EncodedSignal::new(&artifact.signal, encoding, &path)?;
                Ok((path, samples))
            })
            .collect::<Result<Vec<_>, SignalIoError>>()?;

        std::fs::create_dir_all(&self.output_dir).map_err(|source| SignalIoError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        for (path, samples) in encoded.iter() {
            self.io
                .write_encoded(path, samples, self.config.sample_rate)?;
        }

        log::info!(
            "Scene {}: wrote {} {:?} files to {}",
            scene_id,
            encoded.len(),
            encoding,
            self.output_dir.display()
        );
        ctx.advance(RenderStage::Written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scene_dsp::close_floats::*;
    use scene_dsp::DspError;

    use super::*;
    use crate::completeness::expected_files;
    use crate::config::RendererConfigBuilder;
    use crate::scene::{InterfererRef, NamedRef};
    use crate::signal_io::OutputEncoding;

    const SR: u32 = 100;

    /// Returns a fixed gain and counts how often it was asked.
    struct CountingMetric {
        gain: f64,
        calls: AtomicUsize,
    }

    impl SnrMetric for CountingMetric {
        fn snr(&self, _target: &Signal, _noise: &Signal) -> Result<f64, DspError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.gain)
        }
    }

    fn delta(len: usize, gain: f64) -> Signal {
        let mut frames = vec![[0.0; 2]; len];
        frames[0] = [gain, gain];
        Signal::Stereo(frames)
    }

    fn put(path: PathBuf, signal: &Signal) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        WavIo::new(SR)
            .write(&path, signal, SR, OutputEncoding::Float32)
            .unwrap();
    }

    fn scene() -> SceneDescriptor {
        SceneDescriptor {
            scene: "S00001".into(),
            dataset: "train".into(),
            room: NamedRef { name: "R1".into() },
            target: NamedRef { name: "T1".into() },
            interferer: InterfererRef {
                name: "N1".into(),
                kind: "noise".into(),
                offset: 5,
            },
            snr_db: 0.0,
        }
    }

    fn config(num_channels: usize) -> RendererConfig {
        RendererConfigBuilder::default()
            .sample_rate(SR)
            .num_channels(num_channels)
            .pre_duration(0.1)
            .post_duration(0.1)
            .ramp_duration(0.05)
            .tail_duration(0.05)
            .build()
            .unwrap()
    }

    /// Lay out sources, identity room responses for `channels`, and a short anechoic response.
    fn fixture(root: &Path, channels: &[usize]) {
        let layout = InputLayout::new(root);
        let target = Signal::Mono((0..50).map(|i| 0.5 * (i as f64 * 0.3).sin()).collect());
        let noise = Signal::Mono(
            (0..200)
                .map(|i| if i % 2 == 0 { 0.25 } else { -0.25 })
                .collect(),
        );
        put(layout.target("train", "T1"), &target);
        put(layout.interferer("train", "noise", "N1"), &noise);
        for &c in channels {
            put(layout.brir("train", "R1", BrirRole::Target, c), &delta(8, 1.0));
            put(layout.brir("train", "R1", BrirRole::Interferer, c), &delta(8, 1.0));
        }
        put(layout.anechoic_brir("train", "R1"), &delta(4, 1.0));
    }

    #[test]
    fn test_stage_order() {
        assert!(RenderStage::Ramped < RenderStage::PerChannelRendered(1));
        assert!(RenderStage::PerChannelRendered(1) < RenderStage::PerChannelRendered(2));
        assert!(RenderStage::PerChannelRendered(9) < RenderStage::AnechoicBuilt);
    }

    #[test]
    fn test_gain_is_shared_across_channels() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 2, 0]);

        let metric = Arc::new(CountingMetric {
            gain: 2.0,
            calls: AtomicUsize::new(0),
        });
        let renderer = Renderer::new(config(2), dir.path(), dir.path().join("out"))
            .unwrap()
            .with_metric(metric.clone());

        let rendered = renderer.render_signals(&scene()).unwrap();
        assert_eq!(metric.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rendered.reference_gain, Some(2.0));
        assert_eq!(rendered.artifacts.len(), 3 + 3 * 3);

        let ramped = rendered.get(ArtifactRole::Interferer).unwrap();
        assert_eq!(ramped.len(), 70);
        for c in [1, 2, 0] {
            let at_ear = rendered.get(ArtifactRole::InterfererAtChannel(c)).unwrap();
            assert_eq!(at_ear.len(), 75);
            close_slices64(&at_ear.channel(0)[..70], &ramped.scaled(2.0).channel(0), 1e-9);
        }
    }

    #[test]
    fn test_outputs_and_lengths() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 0]);
        let renderer = Renderer::new(config(1), dir.path(), dir.path().join("out")).unwrap();

        let rendered = renderer.render_signals(&scene()).unwrap();
        let names = rendered.file_names().collect::<Vec<_>>();
        assert_eq!(names.first().unwrap(), "S00001_target.wav");
        assert_eq!(names.last().unwrap(), "S00001_target_anechoic.wav");

        let target = rendered.get(ArtifactRole::Target).unwrap();
        assert_eq!(target.len(), 70);
        assert!(target.slice(0..10).samples().all(|x| x == 0.0));

        // The ramp starts from silence.
        let interferer = rendered.get(ArtifactRole::Interferer).unwrap();
        assert_eq!(interferer.channel(0)[0], 0.0);

        // Padded to the 8-frame room response, so the tail is kept in full.
        let anechoic = rendered.get(ArtifactRole::TargetAnechoic).unwrap();
        assert!(anechoic.is_stereo());
        assert_eq!(anechoic.len(), 75);

        let mixed = rendered.get(ArtifactRole::Mixed(1)).unwrap();
        let t = rendered.get(ArtifactRole::TargetAtChannel(1)).unwrap();
        let i = rendered.get(ArtifactRole::InterfererAtChannel(1)).unwrap();
        for ((m, t), i) in mixed.samples().zip(t.samples()).zip(i.samples()) {
            close_floats64(m, t + i, 1e-12);
        }
    }

    #[test]
    fn test_write_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 0]);
        let out = dir.path().join("nested").join("out");
        let renderer = Renderer::new(config(1), dir.path(), &out).unwrap();

        let scene = scene();
        assert!(!renderer.is_rendered(&scene));
        let rendered = renderer.render(&scene).unwrap();
        assert!(renderer.is_rendered(&scene));
        for name in rendered.file_names() {
            assert!(out.join(name).is_file());
        }
    }

    #[test]
    fn test_write_completes_the_stages() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 0]);
        let renderer = Renderer::new(config(1), dir.path(), dir.path().join("out")).unwrap();

        let scene = scene();
        let mut ctx = renderer.build(&scene).unwrap();
        assert_eq!(ctx.stage, Some(RenderStage::AnechoicBuilt));
        renderer.write(&mut ctx).unwrap();
        assert_eq!(ctx.stage, Some(RenderStage::Written));
    }

    #[test]
    fn test_clip_leaves_previous_outputs_alone() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 0]);
        let out = dir.path().join("out");
        let scene = scene();

        Renderer::new(config(1), dir.path(), &out)
            .unwrap()
            .render(&scene)
            .unwrap();
        let snapshot = || {
            expected_files(&scene.scene, &out, 1)
                .iter()
                .map(|p| std::fs::read(p).unwrap())
                .collect::<Vec<_>>()
        };
        let before = snapshot();

        // The raw target and interferer fit in 16 bits, but the boosted interferer at the ear does not.
        let mut pcm16 = config(1);
        pcm16.output_encoding = OutputEncoding::Pcm16;
        let renderer = Renderer::new(pcm16, dir.path(), &out)
            .unwrap()
            .with_metric(Arc::new(CountingMetric {
                gain: 10.0,
                calls: AtomicUsize::new(0),
            }));
        assert!(renderer.render(&scene).unwrap_err().is_clip());

        assert_eq!(snapshot(), before);
        assert!(renderer.is_rendered(&scene));
    }

    #[test]
    fn test_no_channels() {
        let dir = tempfile::tempdir().unwrap();
        // Channel 0 is still needed for the anechoic padding length.
        fixture(dir.path(), &[0]);
        let renderer = Renderer::new(config(0), dir.path(), dir.path().join("out")).unwrap();

        let rendered = renderer.render_signals(&scene()).unwrap();
        assert_eq!(rendered.reference_gain, None);
        assert_eq!(
            rendered.artifacts.iter().map(|a| a.role).collect::<Vec<_>>(),
            vec![
                ArtifactRole::Target,
                ArtifactRole::Interferer,
                ArtifactRole::TargetAnechoic
            ]
        );
    }

    #[test]
    fn test_anechoic_longer_than_room_response() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 0]);
        let layout = InputLayout::new(dir.path());
        put(layout.anechoic_brir("train", "R1"), &delta(16, 1.0));

        let renderer = Renderer::new(config(1), dir.path(), dir.path().join("out")).unwrap();
        let err = renderer.render_signals(&scene()).unwrap_err();
        assert!(!err.is_io());
        assert!(!err.is_invalid_shape());
    }

    #[test]
    fn test_mono_room_response_is_invalid_shape() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[1, 0]);
        let layout = InputLayout::new(dir.path());
        put(
            layout.brir("train", "R1", BrirRole::Target, 1),
            &Signal::Mono(vec![1.0, 0.0]),
        );

        let renderer = Renderer::new(config(1), dir.path(), dir.path().join("out")).unwrap();
        assert!(renderer
            .render_signals(&scene())
            .unwrap_err()
            .is_invalid_shape());
    }

    #[test]
    fn test_missing_and_mismatched_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(config(1), dir.path(), dir.path().join("out")).unwrap();
        assert!(renderer.render(&scene()).unwrap_err().is_io());
        assert!(!dir.path().join("out").exists());

        fixture(dir.path(), &[1, 0]);
        let layout = InputLayout::new(dir.path());
        let path = dir.path().join(layout.target("train", "T1"));
        WavIo::new(SR)
            .write(&path, &Signal::Mono(vec![0.1; 10]), 2 * SR, OutputEncoding::Float32)
            .unwrap();
        assert!(renderer
            .render_signals(&scene())
            .unwrap_err()
            .is_sample_rate_mismatch());
    }

    #[test]
    fn test_empty_speech_filter_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let filter = dir.path().join("filter.wav");
        put(filter.clone(), &Signal::Mono(vec![]));

        let mut config = config(1);
        config.speech_filter = Some(filter);
        let err = Renderer::new(config, dir.path(), dir.path()).unwrap_err();
        assert!(err.is_config());
    }
}
