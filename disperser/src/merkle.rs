use ark_bn254::G2Affine;
use datalayr_primitives::helpers::{keccak256, serialize_g2_be};

use crate::errors::DisclosureError;

pub type Hash = [u8; 32];

pub fn leaf_hash(point: &G2Affine) -> Hash {
    keccak256(&serialize_g2_be(point))
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    keccak256(&buf)
}

/// Keccak Merkle tree over G2 points. `layers[0]` holds the leaf hashes and
/// the last layer the root. An odd node at the end of a layer is paired with
/// itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G2MerkleTree {
    layers: Vec<Vec<Hash>>,
}

impl G2MerkleTree {
    pub fn new(points: &[G2Affine]) -> Result<Self, DisclosureError> {
        if points.is_empty() {
            return Err(DisclosureError::EmptyMerkleTree);
        }
        let mut layers = vec![points.iter().map(leaf_hash).collect::<Vec<_>>()];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next = layer
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            layers.push(next);
        }
        Ok(Self { layers })
    }

    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn num_leaves(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    pub fn leaf(&self, index: usize) -> Option<Hash> {
        self.layers.first().and_then(|leaves| leaves.get(index)).copied()
    }

    /// Sibling hashes from the leaf up to, but excluding, the root.
    pub fn prove_index(&self, index: usize) -> Option<Vec<Hash>> {
        if index >= self.num_leaves() {
            return None;
        }
        let mut position = index;
        let mut proof = Vec::with_capacity(self.layers.len().saturating_sub(1));
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = position ^ 1;
            proof.push(*layer.get(sibling).unwrap_or(&layer[position]));
            position /= 2;
        }
        Some(proof)
    }
}

pub fn verify_proof(index: usize, leaf: &Hash, proof: &[Hash], root: &Hash) -> bool {
    let mut position = index;
    let mut node = *leaf;
    for sibling in proof {
        node = if position % 2 == 0 {
            hash_pair(&node, sibling)
        } else {
            hash_pair(sibling, &node)
        };
        position /= 2;
    }
    position == 0 && &node == root
}

/// Concatenation of the proof hashes, the form posted with a disclosure.
pub fn flatten_proof(proof: &[Hash]) -> Vec<u8> {
    proof.iter().flatten().copied().collect()
}
