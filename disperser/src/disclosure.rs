//! Zero-polynomial disclosures.
//!
//! To contest or reveal one frame on chain, the prover supplies the frame's
//! interpolation polynomial `I`, its G1 commitment, the frame proof `π` and
//! the G2 commitment `Z = [τ^d - x^d]_2` to the vanishing polynomial of the
//! frame's coset. `Z` is not trusted on its own: it is one leaf of a Keccak
//! Merkle tree over the `Z` of every possible coset, and the proof carries
//! the Merkle path. A G2 polynomial-equivalence proof ties the G1 commitments
//! to the revealed coefficients.

use std::sync::Arc;

use ark_bn254::{Fr, G1Affine, G1Projective, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, One, Zero};
use datalayr_primitives::{
    errors::{EncodingError, KzgError},
    fft::FFTSettings,
    frame::Frame,
    header::DataStoreHeader,
    helpers::{fr_to_bytes_be, g2_lincomb, hash_to_field_element, pairings_verify, serialize_g1_be},
    params::get_leading_coset_index,
};
use datalayr_prover::{kzg::commit_coeff_form, srs::SRS};
use datalayr_verifier::verify::{coset_zero_poly_commit, verify_multireveal_impl};
use rayon::prelude::*;
use tracing::{debug, error};

use crate::{
    errors::DisclosureError,
    merkle::{flatten_proof, G2MerkleTree},
};

pub const LOG_MAX_NODES: u32 = 8;
/// Number of leaves of the zero polynomial tree.
pub const MAX_NODES: u32 = 1 << LOG_MAX_NODES;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiRevealProof {
    pub interpolation_poly_commit: G1Affine,
    pub reveal_proof: G1Affine,
    pub zero_poly_commit: G2Affine,
    /// Flattened Merkle path of `zero_poly_commit`.
    pub zero_poly_proof: Vec<u8>,
}

/// Output of a batched disclosure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchDisclosure {
    /// Interpolation polynomial coefficients, 32 bytes big endian each.
    pub polys: Vec<Vec<u8>>,
    pub proofs: Vec<MultiRevealProof>,
    pub equivalence_proof: G2Affine,
}

#[derive(Clone, Debug)]
pub struct DisclosureProver {
    srs: Arc<SRS>,
}

impl DisclosureProver {
    pub fn new(srs: Arc<SRS>) -> Self {
        Self { srs }
    }

    fn tau_pow_g2(&self, degree: u32) -> Result<&G2Affine, DisclosureError> {
        self.srs.g2.get(degree as usize).ok_or_else(|| {
            DisclosureError::KzgError(KzgError::SrsCapacityExceeded {
                polynomial_len: degree as usize + 1,
                srs_len: self.srs.g2.len(),
            })
        })
    }

    /// `[τ^d - x_i^d]_2` where `x_i` is the `i`-th power of a primitive
    /// `(MAX_NODES·d)`-th root of unity.
    pub fn zero_poly_eval(
        &self,
        fs: &FFTSettings,
        index: u32,
        degree: u32,
    ) -> Result<G2Affine, DisclosureError> {
        let x_pow = fs.coset_leader(index as u64).pow([degree as u64]);
        Ok(coset_zero_poly_commit(self.tau_pow_g2(degree)?, &x_pow))
    }

    /// The tree over all `MAX_NODES` zero polynomial commitments for
    /// interpolation polynomials of `degree` coefficients.
    pub fn zero_poly_tree(&self, degree: u32) -> Result<(G2MerkleTree, Vec<G2Affine>), DisclosureError> {
        if !degree.is_power_of_two() {
            return Err(DisclosureError::InvalidDegree(degree));
        }
        let fs = FFTSettings::new(MAX_NODES as usize * degree as usize)
            .map_err(EncodingError::from)?;
        let commits = (0..MAX_NODES)
            .into_par_iter()
            .map(|i| self.zero_poly_eval(&fs, i, degree))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((G2MerkleTree::new(&commits)?, commits))
    }

    /// Merkle path and zero polynomial commitment of leading coset `index`
    /// in a node domain of `num_node` cosets.
    pub fn prepare_zero_polys(
        &self,
        degree: u32,
        index: u32,
        num_node: u64,
    ) -> Result<(Vec<u8>, G2Affine), DisclosureError> {
        check_num_node(num_node)?;
        let (tree, commits) = self.zero_poly_tree(degree)?;
        select_zero_poly(&tree, &commits, index, num_node)
    }

    /// Builds the reveal of `frame` at leading coset `lc_index` and checks it
    /// against the header commitment.
    pub fn prove_interpolating_poly_reveal(
        &self,
        frame: &Frame,
        header: &DataStoreHeader,
        lc_index: u32,
    ) -> Result<MultiRevealProof, DisclosureError> {
        let num_node = header.encoding_params()?.num_node_e;
        check_num_node(num_node)?;
        let (tree, commits) = self.zero_poly_tree(header.degree)?;
        self.reveal(frame, header, lc_index, num_node, &tree, &commits)
    }

    fn reveal(
        &self,
        frame: &Frame,
        header: &DataStoreHeader,
        lc_index: u32,
        num_node: u64,
        tree: &G2MerkleTree,
        commits: &[G2Affine],
    ) -> Result<MultiRevealProof, DisclosureError> {
        let interpolation_poly_commit = commit_coeff_form(&frame.coeffs, &self.srs)?;
        let (zero_poly_proof, zero_poly_commit) = select_zero_poly(tree, commits, lc_index, num_node)?;

        if !verify_multireveal_impl(
            &header.kzg_commit,
            &interpolation_poly_commit,
            &frame.proof,
            &zero_poly_commit,
        ) {
            error!(lc_index, "kzg verification fails for disclosed frame");
            return Err(DisclosureError::RevealPairingFailed { index: lc_index });
        }
        debug!(lc_index, degree = header.degree, "prepared interpolating poly reveal");

        Ok(MultiRevealProof {
            interpolation_poly_commit,
            reveal_proof: frame.proof,
            zero_poly_commit,
            zero_poly_proof,
        })
    }

    /// Disclosure of the frame at linear `position`, with its equivalence
    /// proof.
    pub fn prove_interpolating_poly_disclosure(
        &self,
        frame: &Frame,
        header_bytes: &[u8],
        position: u64,
    ) -> Result<(MultiRevealProof, G2Affine), DisclosureError> {
        let header = DataStoreHeader::decode(header_bytes)?;
        let lc_index =
            get_leading_coset_index(position, header.num_sys as u64, header.num_par as u64)?;
        let proof = self.prove_interpolating_poly_reveal(frame, &header, lc_index)?;
        let equivalence = self.polynomial_equivalence_proof(&frame.coeffs)?;
        Ok((proof, equivalence))
    }

    /// Disclosure of consecutive frames starting at linear position
    /// `starting_index`, with one batched equivalence proof.
    pub fn prove_batch_interpolating_poly_disclosure(
        &self,
        frames: &[Frame],
        header_bytes: &[u8],
        starting_index: u64,
    ) -> Result<BatchDisclosure, DisclosureError> {
        let header = DataStoreHeader::decode(header_bytes)?;
        let num_node = header.encoding_params()?.num_node_e;
        check_num_node(num_node)?;
        let (tree, commits) = self.zero_poly_tree(header.degree)?;
        let proofs = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let lc_index = get_leading_coset_index(
                    starting_index + i as u64,
                    header.num_sys as u64,
                    header.num_par as u64,
                )?;
                self.reveal(frame, &header, lc_index, num_node, &tree, &commits)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let polys: Vec<&[Fr]> = frames.iter().map(|frame| frame.coeffs.as_slice()).collect();
        let commits: Vec<G1Affine> = proofs
            .iter()
            .map(|proof| proof.interpolation_poly_commit)
            .collect();
        let equivalence_proof = self.batch_polynomial_equivalence_proof(&polys, &commits)?;

        Ok(BatchDisclosure {
            polys: frames
                .iter()
                .map(|frame| frame.coeffs.iter().flat_map(fr_to_bytes_be).collect())
                .collect(),
            proofs,
            equivalence_proof,
        })
    }

    /// `[p(τ)]_2`, the G2 twin of a G1 commitment.
    pub fn polynomial_equivalence_proof(&self, poly: &[Fr]) -> Result<G2Affine, DisclosureError> {
        if poly.len() > self.srs.g2.len() {
            return Err(DisclosureError::KzgError(
                KzgError::SrsCapacityExceeded {
                    polynomial_len: poly.len(),
                    srs_len: self.srs.g2.len(),
                },
            ));
        }
        Ok(g2_lincomb(&self.srs.g2[..poly.len()], poly)?)
    }

    /// `Σ γ^i [p_i(τ)]_2` with `γ` derived from the G1 commitments.
    pub fn batch_polynomial_equivalence_proof(
        &self,
        polys: &[&[Fr]],
        commits: &[G1Affine],
    ) -> Result<G2Affine, DisclosureError> {
        let gamma = equivalence_challenge(commits);
        let max_len = polys.iter().map(|poly| poly.len()).max().unwrap_or(0);
        let mut combined = vec![Fr::zero(); max_len];
        let mut weight = Fr::one();
        for poly in polys {
            for (acc, coeff) in combined.iter_mut().zip(poly.iter()) {
                *acc += weight * coeff;
            }
            weight *= gamma;
        }
        self.polynomial_equivalence_proof(&combined)
    }
}

fn check_num_node(num_node: u64) -> Result<(), DisclosureError> {
    if num_node == 0 || num_node > MAX_NODES as u64 {
        return Err(DisclosureError::UnsupportedNodeCount {
            num_node,
            max: MAX_NODES as u64,
        });
    }
    Ok(())
}

fn select_zero_poly(
    tree: &G2MerkleTree,
    commits: &[G2Affine],
    index: u32,
    num_node: u64,
) -> Result<(Vec<u8>, G2Affine), DisclosureError> {
    // fewer nodes spread their cosets further apart on the circle
    let scaled = (index as u64 * MAX_NODES as u64 / num_node) as usize;
    match (tree.prove_index(scaled), commits.get(scaled)) {
        (Some(proof), Some(commit)) => Ok((flatten_proof(&proof), *commit)),
        _ => Err(DisclosureError::UnsupportedNodeCount {
            num_node,
            max: MAX_NODES as u64,
        }),
    }
}

fn equivalence_challenge(commits: &[G1Affine]) -> Fr {
    let transcript: Vec<u8> = commits.iter().flat_map(serialize_g1_be).collect();
    hash_to_field_element(&transcript)
}

/// `e(C, G2) == e(G1, proof)`.
pub fn verify_polynomial_equivalence(commit: &G1Affine, proof: &G2Affine) -> bool {
    pairings_verify(*commit, G2Affine::generator(), G1Affine::generator(), *proof)
}

pub fn verify_batch_polynomial_equivalence(commits: &[G1Affine], proof: &G2Affine) -> bool {
    let gamma = equivalence_challenge(commits);
    let mut weight = Fr::one();
    let mut combined = G1Projective::zero();
    for commit in commits {
        combined += commit.into_group() * weight;
        weight *= gamma;
    }
    verify_polynomial_equivalence(&combined.into_affine(), proof)
}
