mod baselines;
mod exercises;
mod programs;
mod users;
mod workouts;
