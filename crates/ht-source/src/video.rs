// Décodage vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`        : interroge ffprobe pour obtenir width/height/fps
//   - `spawn_ffmpeg_pipe`  : lance ffmpeg (-stream_loop -1) → flux RGBA sur stdout
//   - `VideoSource::spawn` : thread dédié, lit les frames, gère les commandes
//   - `process_commands`   : dispatche les commandes dans la boucle du thread
//   - `find_or_create_slot`: pool Arc<FrameBuffer> sans allocation en régime

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use ht_core::error::CoreError;
use ht_core::frame::FrameBuffer;
use ht_core::traits::{MediaKind, Source, SourceEvent};

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal (3) pour garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

/// Capacité du canal de frames vers la boucle de rendu.
const FRAME_CHANNEL_CAP: usize = 3;

/// Capacité du canal de commandes vers le thread vidéo.
const COMMAND_CHANNEL_CAP: usize = 16;

/// Commandes pour le thread vidéo.
///
/// # Example
/// ```
/// use ht_source::video::VideoCommand;
/// let cmd = VideoCommand::Resize(600);
/// assert!(matches!(cmd, VideoCommand::Resize(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCommand {
    /// Reprendre la lecture.
    Play,
    /// Mettre en pause (la dernière frame reste disponible).
    Pause,
    /// Nouvelle taille de rendu : redémarre ffmpeg avec un nouveau `-vf scale`.
    Resize(u32),
    /// Arrêter le thread proprement.
    Quit,
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Taille de décodage : conserve le ratio natif, le petit côté couvre
/// `render_size`, sans jamais agrandir au-delà de la taille native.
///
/// # Example
/// ```
/// use ht_source::video::decode_size;
/// assert_eq!(decode_size(1920, 1080, 300), (533, 300));
/// assert_eq!(decode_size(320, 240, 600), (320, 240));
/// ```
#[must_use]
pub fn decode_size(native_w: u32, native_h: u32, render_size: u32) -> (u32, u32) {
    let short = native_w.min(native_h).max(1);
    let scale = (f64::from(render_size) / f64::from(short)).min(1.0);
    let w = (f64::from(native_w) * scale).round().max(1.0) as u32;
    let h = (f64::from(native_h) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si l'entrée
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(input: &str) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            input,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout));
    if info.width == 0 || info.height == 0 {
        return Err(CoreError::InvalidDimensions {
            width: info.width,
            height: info.height,
        })
        .with_context(|| format!("ffprobe n'a trouvé aucun flux vidéo dans {input}"));
    }

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({input})",
        info.width,
        info.height,
        info.fps
    );
    Ok(info)
}

/// Parse la sortie `key=value` de ffprobe. Champs absents → 0 (fps → 30).
fn parse_probe_output(text: &str) -> VideoInfo {
    let mut info = VideoInfo {
        width: 0,
        height: 0,
        fps: 30.0,
    };
    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            info.width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            info.height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                info.fps = num / den;
            }
        }
    }
    info
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-stream_loop -1` boucle l'entrée indéfiniment, `-an` coupe l'audio.
///
/// Retourne `None` si le spawn échoue (log::warn émis).
#[must_use]
pub fn spawn_ffmpeg_pipe(input: &str, w: u32, h: u32, looping: bool) -> Option<Child> {
    let scale_filter = format!("scale={w}:{h}:flags=bilinear");

    let mut command = Command::new("ffmpeg");
    if looping {
        command.args(["-stream_loop", "-1"]);
    }
    command.args([
        "-i",
        input,
        "-vf",
        &scale_filter,
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-an",
        "-hide_banner",
        "-loglevel",
        "error",
    ]);
    if !looping {
        command.args(["-frames:v", "1"]);
    }
    command.arg("pipe:1");

    match command
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            log::debug!("ffmpeg spawné: {w}x{h} (loop={looping})");
            Some(child)
        }
        Err(e) => {
            log::warn!("spawn_ffmpeg_pipe: impossible de lancer ffmpeg: {e}");
            None
        }
    }
}

/// Lit exactement une frame. `Ok(false)` sur fin de flux.
fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Décode la première image de `input` via ffmpeg (URL d'image distante).
///
/// # Errors
/// Returns an error if ffprobe/ffmpeg fail or produce a truncated frame.
pub fn decode_single_frame(input: &str) -> Result<FrameBuffer> {
    let info = probe_video(input)?;
    let child = spawn_ffmpeg_pipe(input, info.width, info.height, false)
        .ok_or_else(|| CoreError::Decode {
            reference: input.to_string(),
            reason: "ffmpeg indisponible".into(),
        })?;
    let mut frame = FrameBuffer::new(info.width, info.height);
    let complete = read_first_frame(child, &mut frame.data)?;
    if !complete {
        return Err(CoreError::Decode {
            reference: input.to_string(),
            reason: "frame tronquée".into(),
        }
        .into());
    }
    Ok(frame)
}

/// Lit une frame sur stdout de `child`, puis tue et récupère le processus,
/// que la lecture ait réussi ou non.
fn read_first_frame(child: Child, buf: &mut [u8]) -> Result<bool> {
    let mut child = Some(child);
    let read = match child.as_mut().and_then(|c| c.stdout.as_mut()) {
        Some(stdout) => read_frame(stdout, buf),
        None => Ok(false),
    };
    reap(&mut child);
    read
}

/// Tue et récupère un processus ffmpeg.
fn reap(child: &mut Option<Child>) {
    if let Some(mut c) = child.take() {
        let _ = c.kill();
        let _ = c.wait();
    }
}

/// État mutable centralisé du thread vidéo.
struct VideoState {
    info: VideoInfo,
    /// Dimensions actuelles du pipe ffmpeg.
    w: u32,
    h: u32,
    is_paused: bool,
    /// Pool pré-alloué de frames réutilisables.
    pool: Vec<Arc<FrameBuffer>>,
    /// Frames lues depuis le dernier (re)spawn de ffmpeg.
    frames_since_spawn: u64,
    /// `true` une fois `Ready` envoyé.
    announced: bool,
}

impl VideoState {
    fn new(info: VideoInfo, render_size: u32) -> Self {
        let (w, h) = decode_size(info.width, info.height, render_size);
        Self {
            info,
            w,
            h,
            is_paused: false,
            pool: Vec::new(),
            frames_since_spawn: 0,
            announced: false,
        }
        .with_pool()
    }

    fn with_pool(mut self) -> Self {
        self.pool = (0..POOL_SIZE)
            .map(|_| Arc::new(FrameBuffer::new(self.w, self.h)))
            .collect();
        self
    }
}

/// Retourne `true` si le thread doit quitter (Quit reçu ou canal déconnecté).
/// Redémarre ffmpeg en interne si un Resize change la taille de décodage.
fn process_commands(
    cmd_rx: &Receiver<VideoCommand>,
    state: &mut VideoState,
    child: &mut Option<Child>,
    input: &str,
) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(VideoCommand::Quit) | Err(flume::TryRecvError::Disconnected) => {
                reap(child);
                log::info!("Thread vidéo: arrêt demandé.");
                return true;
            }
            Ok(VideoCommand::Pause) => {
                state.is_paused = true;
                log::debug!("Thread vidéo: Pause");
            }
            Ok(VideoCommand::Play) => {
                state.is_paused = false;
                log::debug!("Thread vidéo: Play");
            }
            Ok(VideoCommand::Resize(render_size)) => {
                let (nw, nh) = decode_size(state.info.width, state.info.height, render_size);
                if (nw, nh) != (state.w, state.h) {
                    state.w = nw;
                    state.h = nh;
                    state.pool.clear();
                    for _ in 0..POOL_SIZE {
                        state.pool.push(Arc::new(FrameBuffer::new(nw, nh)));
                    }
                    reap(child);
                    *child = spawn_ffmpeg_pipe(input, nw, nh, true);
                    state.frames_since_spawn = 0;
                    log::debug!("Thread vidéo: Resize -> {nw}x{nh}");
                }
            }
            Err(flume::TryRecvError::Empty) => return false,
        }
    }
}

/// Trouve ou crée un slot libre dans le pool.
///
/// Invariant : retourne un index `i` tel que `Arc::strong_count(&pool[i]) == 1`
/// et dont le buffer a la taille courante.
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        if pool[i].width != w || pool[i].height != h {
            pool[i] = Arc::new(FrameBuffer::new(w, h));
        }
        i
    } else {
        // Pool saturé : allouer plutôt que bloquer le décodeur.
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

/// Source vidéo bouclée, décodée par ffmpeg sur un thread dédié.
///
/// Le drop envoie `Quit` et déconnecte le canal : le thread tue ffmpeg et
/// sort à sa prochaine itération, aucune frame ne survit à un changement de source.
pub struct VideoSource {
    event_rx: Receiver<SourceEvent>,
    cmd_tx: Sender<VideoCommand>,
    render_size: u32,
}

impl VideoSource {
    /// Spawne le thread de décodage pour `input` (chemin local ou URL).
    ///
    /// Le probe ffprobe a lieu dans le thread : un échec arrive sous forme
    /// de `SourceEvent::Failed`.
    ///
    /// # Errors
    /// Retourne une erreur si le thread ne peut pas être créé.
    ///
    /// # Example
    /// ```no_run
    /// use ht_source::video::VideoSource;
    /// let source = VideoSource::spawn("loop.mp4", 300).unwrap();
    /// ```
    pub fn spawn(input: &str, render_size: u32) -> Result<Self> {
        let (event_tx, event_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let (cmd_tx, cmd_rx) = flume::bounded(COMMAND_CHANNEL_CAP);
        let input = input.to_string();

        thread::Builder::new()
            .name("ht-video".to_string())
            .spawn(move || match probe_video(&input) {
                Ok(info) => video_loop(&input, &event_tx, &cmd_rx, info, render_size),
                Err(e) => {
                    log::warn!("Vidéo indisponible : {e:#}");
                    let _ = event_tx.send(SourceEvent::Failed(format!("{e:#}")));
                }
            })
            .context("Impossible de spawner le thread vidéo")?;

        Ok(Self {
            event_rx,
            cmd_tx,
            render_size,
        })
    }
}

impl VideoSource {
    /// Envoi non bloquant : le thread peut être occupé (probe d'une URL lente).
    fn send_command(&self, cmd: VideoCommand) {
        if let Err(e) = self.cmd_tx.try_send(cmd) {
            log::debug!("Commande vidéo {cmd:?} ignorée : {e}");
        }
    }
}

impl Source for VideoSource {
    fn kind(&self) -> MediaKind {
        MediaKind::LoopingVideo
    }

    fn poll_event(&mut self) -> Option<SourceEvent> {
        self.event_rx.try_recv().ok()
    }

    fn retarget(&mut self, render_size: u32) {
        if render_size != self.render_size {
            self.render_size = render_size;
            self.send_command(VideoCommand::Resize(render_size));
        }
    }

    fn set_paused(&mut self, paused: bool) {
        let cmd = if paused {
            VideoCommand::Pause
        } else {
            VideoCommand::Play
        };
        self.send_command(cmd);
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        // Canal plein : la déconnexion de `cmd_tx` suffit à arrêter le thread.
        self.send_command(VideoCommand::Quit);
        // Déconnecte le canal d'événements : un `send` en attente côté thread échoue.
        let (_, dead_rx) = flume::bounded(0);
        drop(std::mem::replace(&mut self.event_rx, dead_rx));
    }
}

/// Boucle principale du thread vidéo.
fn video_loop(
    input: &str,
    event_tx: &Sender<SourceEvent>,
    cmd_rx: &Receiver<VideoCommand>,
    info: VideoInfo,
    render_size: u32,
) {
    let mut state = VideoState::new(info, render_size);
    let frame_period = Duration::from_secs_f64(1.0 / info.fps.clamp(1.0, 120.0));
    let mut child = spawn_ffmpeg_pipe(input, state.w, state.h, true);
    let mut last_frame = Instant::now()
        .checked_sub(frame_period)
        .unwrap_or_else(Instant::now);

    loop {
        // === Commandes (non-bloquant) ===
        if process_commands(cmd_rx, &mut state, &mut child, input) {
            return;
        }

        if child.is_none() {
            let _ = event_tx.send(SourceEvent::Failed("ffmpeg indisponible".into()));
            return;
        }

        // === Pause ===
        if state.is_paused {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        // === Cadence native ===
        let elapsed = last_frame.elapsed();
        if let Some(remaining) = frame_period.checked_sub(elapsed) {
            thread::sleep(remaining.min(Duration::from_millis(10)));
            continue;
        }
        last_frame = Instant::now();

        // === Slot libre dans le pool ===
        let frame_bytes = state.w as usize * state.h as usize * 4;
        let idx = find_or_create_slot(&mut state.pool, state.w, state.h);
        let Some(fb) = Arc::get_mut(&mut state.pool[idx]) else {
            continue;
        };

        let read_result = child
            .as_mut()
            .and_then(|c| c.stdout.as_mut())
            .map_or(Ok(false), |stdout| {
                read_frame(stdout, &mut fb.data[..frame_bytes])
            });

        match read_result {
            Ok(true) => {
                state.frames_since_spawn += 1;
                let frame = Arc::clone(&state.pool[idx]);
                let event = if state.announced {
                    SourceEvent::Frame(frame)
                } else {
                    state.announced = true;
                    log::info!("Vidéo prête : {input} ({}x{})", state.w, state.h);
                    SourceEvent::Ready(frame)
                };
                if event_tx.send(event).is_err() {
                    reap(&mut child);
                    return;
                }
            }
            Ok(false) if state.frames_since_spawn > 0 => {
                // Flux non bouclable (pipe, live) : on relance depuis le début.
                log::debug!("Thread vidéo: fin de flux, relance de la boucle.");
                reap(&mut child);
                child = spawn_ffmpeg_pipe(input, state.w, state.h, true);
                state.frames_since_spawn = 0;
            }
            Ok(false) => {
                log::warn!("Thread vidéo: aucune frame décodée depuis {input}");
                reap(&mut child);
                let _ = event_tx.send(SourceEvent::Failed(format!(
                    "aucune frame décodée depuis {input}"
                )));
                return;
            }
            Err(e) => {
                log::warn!("Thread vidéo: erreur lecture pipe: {e}");
                reap(&mut child);
                let _ = event_tx.send(SourceEvent::Failed(e.to_string()));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_parsing() {
        let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n");
        assert_eq!((info.width, info.height), (1280, 720));
        assert!((info.fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn probe_output_without_stream_is_degenerate() {
        let info = parse_probe_output("");
        assert_eq!((info.width, info.height), (0, 0));
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decode_size_keeps_aspect_and_covers() {
        assert_eq!(decode_size(1920, 1080, 600), (1067, 600));
        assert_eq!(decode_size(1080, 1920, 600), (600, 1067));
        assert_eq!(decode_size(640, 640, 300), (300, 300));
        // Jamais d'agrandissement.
        assert_eq!(decode_size(200, 100, 800), (200, 100));
    }

    #[test]
    fn pool_reuses_free_slots() {
        let mut pool: Vec<Arc<FrameBuffer>> =
            (0..2).map(|_| Arc::new(FrameBuffer::new(4, 4))).collect();
        let held = Arc::clone(&pool[0]);
        assert_eq!(find_or_create_slot(&mut pool, 4, 4), 1);
        let held2 = Arc::clone(&pool[1]);
        assert_eq!(find_or_create_slot(&mut pool, 4, 4), 2);
        assert_eq!(pool.len(), 3);
        drop((held, held2));
    }

    #[test]
    fn pool_slot_matches_current_size() {
        let mut pool = vec![Arc::new(FrameBuffer::new(4, 4))];
        let idx = find_or_create_slot(&mut pool, 8, 2);
        assert_eq!((pool[idx].width, pool[idx].height), (8, 2));
    }

    #[test]
    fn commands_never_block_a_busy_decoder() {
        let (event_tx, event_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let (cmd_tx, cmd_rx) = flume::bounded(COMMAND_CHANNEL_CAP);
        let mut source = VideoSource {
            event_rx,
            cmd_tx,
            render_size: 300,
        };
        // Personne ne lit `cmd_rx` : un `send` bloquant resterait coincé ici.
        for i in 0..(COMMAND_CHANNEL_CAP * 3) {
            source.set_paused(i % 2 == 0);
        }
        source.retarget(600);
        drop(source);
        assert_eq!(cmd_rx.len(), COMMAND_CHANNEL_CAP);
        drop(event_tx);
    }

    #[test]
    fn retarget_only_sends_on_change() {
        let (_event_tx, event_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let (cmd_tx, cmd_rx) = flume::bounded(COMMAND_CHANNEL_CAP);
        let mut source = VideoSource {
            event_rx,
            cmd_tx,
            render_size: 300,
        };
        source.retarget(300);
        source.retarget(450);
        source.retarget(450);
        assert_eq!(cmd_rx.try_iter().collect::<Vec<_>>(), vec![VideoCommand::Resize(450)]);
    }

    #[cfg(unix)]
    #[test]
    fn first_frame_read_reaps_the_child() {
        let child = Command::new("sh")
            .args(["-c", "printf abcdefgh; sleep 5"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let start = Instant::now();
        let mut buf = [0u8; 4];
        assert!(read_first_frame(child, &mut buf).unwrap());
        assert_eq!(&buf, b"abcd");
        // Le `sleep` est tué, pas attendu.
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn short_stream_is_not_a_frame() {
        let child = Command::new("sh")
            .args(["-c", "printf ab"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut buf = [0u8; 4];
        assert!(!read_first_frame(child, &mut buf).unwrap());
    }

    #[test]
    fn read_frame_reports_eof() {
        let data = [1u8; 6];
        let mut reader = &data[..];
        let mut buf = [0u8; 4];
        assert!(read_frame(&mut reader, &mut buf).unwrap());
        assert!(!read_frame(&mut reader, &mut buf).unwrap());
    }
}
