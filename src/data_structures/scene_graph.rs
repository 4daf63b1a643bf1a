//! Scene graph of loaded models.
//!
//! A loaded model is a tree of [`SceneNode`]s below a root group. Every node
//! keeps the index it had in the source glTF document so animation tracks can
//! find their targets, and carries its local [`Instance`] transform. The root
//! is shared as a [`NodeRef`] between the caller's scene and the animation
//! player that moves its children.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    data_structures::{instance::Instance, material::Material, mesh::Mesh},
    sampler::PointCloud,
};

/// A node shared between the scene and the animation scheduler.
pub type NodeRef = Arc<Mutex<SceneNode>>;

/// Something a node draws.
#[derive(Clone, Debug)]
pub enum Renderable {
    Mesh(Mesh),
    Points(PointCloud),
}

#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: String,
    /// Index of the node in the source document, `None` for generated nodes.
    pub source_index: Option<usize>,
    pub local: Instance,
    pub renderables: Vec<Renderable>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A generated group with the given children.
    pub fn group(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self {
            children,
            ..Self::new(name)
        }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.renderables.push(Renderable::Mesh(mesh));
        self
    }

    pub fn into_ref(self) -> NodeRef {
        Arc::new(Mutex::new(self))
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first, parents before children.
    pub fn traverse(&self, f: &mut dyn FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut(&mut self, f: &mut dyn FnMut(&mut SceneNode)) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    pub fn find_by_source(&self, index: usize) -> Option<&SceneNode> {
        if self.source_index == Some(index) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_by_source(index))
    }

    pub fn find_by_source_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        if self.source_index == Some(index) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_by_source_mut(index))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_name(name))
    }

    pub fn meshes(&self) -> Vec<&Mesh> {
        let mut meshes = Vec::new();
        self.collect_meshes(&mut meshes);
        meshes
    }

    fn collect_meshes<'a>(&'a self, out: &mut Vec<&'a Mesh>) {
        out.extend(self.renderables.iter().filter_map(|r| match r {
            Renderable::Mesh(mesh) => Some(mesh),
            Renderable::Points(_) => None,
        }));
        for child in &self.children {
            child.collect_meshes(out);
        }
    }

    pub fn point_clouds(&self) -> Vec<&PointCloud> {
        let mut out = Vec::new();
        self.collect_points(&mut out);
        out
    }

    fn collect_points<'a>(&'a self, out: &mut Vec<&'a PointCloud>) {
        out.extend(self.renderables.iter().filter_map(|r| match r {
            Renderable::Points(cloud) => Some(cloud),
            Renderable::Mesh(_) => None,
        }));
        for child in &self.children {
            child.collect_points(out);
        }
    }

    /// Replaces the material of every mesh in the subtree.
    pub fn set_material_all(&mut self, material: &Material) {
        self.traverse_mut(&mut |node| {
            for renderable in node.renderables.iter_mut() {
                if let Renderable::Mesh(mesh) = renderable {
                    mesh.material = material.clone();
                }
            }
        });
    }

    /// World transforms of every node, parents before children.
    pub fn world_transforms(&self) -> Vec<(String, Instance)> {
        let mut out = Vec::new();
        self.collect_world(&Instance::default(), &mut out);
        out
    }

    fn collect_world(&self, parent: &Instance, out: &mut Vec<(String, Instance)>) {
        let world = parent * &self.local;
        out.push((self.name.clone(), world));
        for child in &self.children {
            child.collect_world(&world, out);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}
