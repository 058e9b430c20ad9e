#[cfg(test)]
mod common;

#[cfg(test)]
mod unify_test;

#[cfg(test)]
mod backtracking_test;


#[cfg(test)]
mod dummy_test;


#[cfg(test)]
mod auto_step_test;

#[cfg(test)]
mod session_test;
