//! Sauvegarde et chargement d'une carte découverte.
//!
//! Deux formats: le JSON `{"cells": [[..]], "explored": [[..]]}` indexé `[x][y]`,
//! et un format binaire compact:
//!
//! ```text
//! "MMZ1" | taille (u8) | taille² masques (u8, x puis y) | taille x explorés (u16 LE, bit y)
//! ```
//!
//! Les distances ne sont jamais sauvegardées: il faut recalculer après chargement.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::{MouseError, Result};
use crate::maze::{Maze, MAZE_SIZE};

const MAGIC: &[u8; 4] = b"MMZ1";

/// Carte sauvegardée: masques de murs et cases explorées.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMaze {
    pub cells: Vec<Vec<u8>>,
    pub explored: Vec<Vec<bool>>,
}

impl SavedMaze {
    pub fn from_maze(maze: &Maze) -> Self {
        Self {
            cells: maze
                .cell_grid()
                .iter()
                .map(|column| column.iter().map(|c| c.mask()).collect())
                .collect(),
            explored: maze.explored_grid().iter().map(|c| c.to_vec()).collect(),
        }
    }

    /// Reconstruit la carte (sans distances) en vérifiant la taille et la symétrie des murs.
    pub fn to_maze(&self) -> Result<Maze> {
        if !is_square(&self.cells) || !is_square(&self.explored) {
            return Err(MouseError::MazeInconsistency(format!(
                "saved maze is not {}x{}",
                MAZE_SIZE, MAZE_SIZE
            )));
        }

        let mut cells = [[Cell::default(); MAZE_SIZE]; MAZE_SIZE];
        let mut explored = [[false; MAZE_SIZE]; MAZE_SIZE];
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                cells[x][y] = Cell::from_mask(self.cells[x][y]).ok_or_else(|| {
                    MouseError::MazeInconsistency(format!(
                        "invalid wall mask {} at ({}, {})",
                        self.cells[x][y], x, y
                    ))
                })?;
                explored[x][y] = self.explored[x][y];
            }
        }
        Maze::from_grids(cells, explored)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Écrit le format binaire.
    pub fn write_binary<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u8(MAZE_SIZE as u8)?;
        for column in &self.cells {
            for &mask in column {
                writer.write_u8(mask)?;
            }
        }
        for column in &self.explored {
            let bits = column
                .iter()
                .enumerate()
                .filter(|(_, explored)| **explored)
                .fold(0u16, |bits, (y, _)| bits | (1 << y));
            writer.write_u16::<LittleEndian>(bits)?;
        }
        Ok(())
    }

    /// Lit le format binaire.
    pub fn read_binary<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(invalid_data("bad magic"));
        }
        let size = reader.read_u8()? as usize;
        if size != MAZE_SIZE {
            return Err(invalid_data(&format!("unsupported maze size {}", size)));
        }

        let mut cells = vec![vec![0u8; MAZE_SIZE]; MAZE_SIZE];
        for column in cells.iter_mut() {
            reader.read_exact(column)?;
        }

        let mut explored = Vec::with_capacity(MAZE_SIZE);
        for _ in 0..MAZE_SIZE {
            let bits = reader.read_u16::<LittleEndian>()?;
            explored.push((0..MAZE_SIZE).map(|y| bits & (1 << y) != 0).collect());
        }

        Ok(Self { cells, explored })
    }

    pub fn save_binary(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_binary(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_binary(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_binary(&mut reader)
    }
}

fn is_square<T>(grid: &[Vec<T>]) -> bool {
    grid.len() == MAZE_SIZE && grid.iter().all(|column| column.len() == MAZE_SIZE)
}

fn invalid_data(message: &str) -> MouseError {
    MouseError::Io(io::Error::new(io::ErrorKind::InvalidData, message.to_string()))
}
