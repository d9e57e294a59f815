use ark_bn254::{Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{CurveGroup, PrimeGroup};
use crossbeam_channel::{bounded, Receiver, Sender};
use datalayr_primitives::{errors::KzgError, helpers::compute_powers, traits::ReadPointFromBytes};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::time::Instant;
use tracing::{debug, info};

/// Where to find the trusted setup and how to load it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KzgConfig {
    /// File of `srs_order` gnark-compressed G1 points, 32 bytes each.
    pub g1_path: String,
    /// File of `srs_order` gnark-compressed G2 points, 64 bytes each.
    pub g2_path: String,
    pub srs_order: u32,
    /// Parser threads used while loading; 0 means one per CPU.
    pub num_worker: usize,
    pub verbose: bool,
}

impl Default for KzgConfig {
    fn default() -> Self {
        Self {
            g1_path: "resources/srs/g1.point".to_string(),
            g2_path: "resources/srs/g2.point".to_string(),
            srs_order: 3000,
            num_worker: 0,
            verbose: false,
        }
    }
}

/// Represents the Structured Reference String (SRS) used in KZG commitments.
///
/// Both groups hold `[τ^i]` for `i < order`. The low-degree proof needs the
/// top of the G1 table and the matching G2 power, so the whole table is
/// always loaded.
#[derive(Debug, PartialEq, Clone)]
pub struct SRS {
    pub g1: Vec<G1Affine>,
    pub g2: Vec<G2Affine>,
    /// The order of the SRS.
    pub order: u32,
}

impl SRS {
    /// Loads both tables from the files named in `config`.
    pub fn new(config: &KzgConfig) -> Result<Self, KzgError> {
        if config.srs_order == 0 {
            return Err(KzgError::GenericError(
                "SRS order must be positive.".to_string(),
            ));
        }
        let start = Instant::now();
        let workers = if config.num_worker == 0 {
            num_cpus::get()
        } else {
            config.num_worker
        };

        let g1 = Self::parallel_read_points::<G1Affine>(
            config.g1_path.clone(),
            config.srs_order,
            workers,
        )?;
        let g2 = Self::parallel_read_points::<G2Affine>(
            config.g2_path.clone(),
            config.srs_order,
            workers,
        )?;

        info!(
            order = config.srs_order,
            workers,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded srs"
        );

        Ok(Self {
            g1,
            g2,
            order: config.srs_order,
        })
    }

    /// Builds the tables from a known secret. Anyone holding `tau` can forge
    /// proofs; this is for tests and local networks only.
    pub fn from_secret(tau: Fr, order: u32) -> Result<Self, KzgError> {
        if order == 0 {
            return Err(KzgError::GenericError(
                "SRS order must be positive.".to_string(),
            ));
        }
        let powers = compute_powers(&tau, order as usize);

        let g1: Vec<G1Projective> = powers
            .par_iter()
            .map(|p| G1Projective::generator() * p)
            .collect();
        let g2: Vec<G2Projective> = powers
            .par_iter()
            .map(|p| G2Projective::generator() * p)
            .collect();

        debug!(order, "generated srs from secret");
        Ok(Self {
            g1: G1Projective::normalize_batch(&g1),
            g2: G2Projective::normalize_batch(&g2),
            order,
        })
    }

    pub fn process_chunks<T>(receiver: Receiver<(Vec<u8>, usize)>) -> Result<Vec<(T, usize)>, KzgError>
    where
        T: ReadPointFromBytes,
    {
        receiver
            .iter()
            .map(|(chunk, position)| {
                T::read_point_from_bytes_be(&chunk)
                    .map(|point| (point, position))
                    .map_err(|e| KzgError::SerializationError(e.to_string()))
            })
            .collect()
    }

    /// Reads points in parallel from a file: one reader thread fans raw bytes
    /// out to `num_workers` parser threads, and the parsed points are sorted
    /// back into file order.
    fn parallel_read_points<T>(
        file_path: String,
        points_to_load: u32,
        num_workers: usize,
    ) -> Result<Vec<T>, KzgError>
    where
        T: ReadPointFromBytes + Send + 'static,
    {
        let (sender, receiver) = bounded::<(Vec<u8>, usize)>(1000);
        let point_size = T::COMPRESSED_SIZE;

        let reader_handle = std::thread::spawn(move || {
            Self::read_file_chunks(&file_path, sender, point_size, points_to_load)
        });

        let workers: Vec<_> = (0..num_workers.max(1))
            .map(|_| {
                let receiver = receiver.clone();
                std::thread::spawn(move || Self::process_chunks::<T>(receiver))
            })
            .collect();
        drop(receiver);

        match reader_handle.join() {
            Ok(Ok(())) => {},
            Ok(Err(e)) => return Err(KzgError::GenericError(e.to_string())),
            Err(_) => {
                return Err(KzgError::GenericError(
                    "Reader thread panicked.".to_string(),
                ))
            },
        }

        let mut all_points = Vec::with_capacity(points_to_load as usize);
        for worker in workers {
            let points = worker
                .join()
                .map_err(|_| KzgError::GenericError("Worker thread panicked.".to_string()))??;
            all_points.extend(points);
        }

        // Sort by original position to maintain order
        all_points.sort_by_key(|&(_, position)| position);

        if all_points.len() != points_to_load as usize {
            return Err(KzgError::GenericError(format!(
                "Expected {} points, but got {}.",
                points_to_load,
                all_points.len()
            )));
        }

        Ok(all_points.into_iter().map(|(point, _)| point).collect())
    }

    /// Sends `num_points` fixed-size records from the file down the channel,
    /// tagged with their byte offset.
    fn read_file_chunks(
        file_path: &str,
        sender: Sender<(Vec<u8>, usize)>,
        point_size: usize,
        num_points: u32,
    ) -> io::Result<()> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::new(file);
        let mut position = 0;

        for _ in 0..num_points {
            let mut buffer = vec![0u8; point_size];
            match reader.read_exact(&mut buffer) {
                Ok(()) => {},
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            sender
                .send((buffer, position))
                .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))?;
            position += point_size;
        }
        Ok(())
    }
}
